//! 欢迎邮件工作者服务
//!
//! 从 Kafka 消费用户注册事件，为每位新用户发送一封欢迎邮件。
//! 投递为尽力而为：单条消息解码或发送失败只记录日志后丢弃，
//! 消费循环永不因个别坏消息而停止。

pub mod consumer;
pub mod error;
pub mod event;
pub mod health;
pub mod sender;
pub mod templates;
