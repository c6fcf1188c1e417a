//! 注册事件模型与解码
//!
//! 定义上游注册服务发布到 `new-user` topic 的事件结构。
//! 字段全部带 `#[serde(default)]`：schema 只要求结构上是合法 JSON，
//! 缺失字段回落为零值（0、空字符串、Unix 纪元），由下游按原样渲染。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// 用户注册事件
///
/// 每条 Kafka 消息反序列化出一个事件，消费完即丢弃，不做任何缓存。
/// `address` 与 `registration_date` 随事件携带但不参与邮件内容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub address: String,

    #[serde(default = "unix_epoch")]
    pub registration_date: DateTime<Utc>,

    #[serde(default)]
    pub role: String,
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// 将消息负载解码为注册事件
///
/// 负载不是合法 JSON 或形状不符时返回 DecodeFailed，调用方丢弃该消息；
/// 解码本身无副作用，对任意字节序列都不会 panic。
pub fn decode(payload: &[u8]) -> Result<RegistrationEvent, WorkerError> {
    serde_json::from_slice(payload).map_err(|e| WorkerError::DecodeFailed(e.to_string()))
}
