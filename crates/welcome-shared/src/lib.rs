//! 共享库
//!
//! 包含欢迎邮件服务共用的配置、错误处理、Kafka 和日志等基础设施代码。

pub mod config;
pub mod error;
pub mod kafka;
pub mod observability;
