//! 欢迎邮件服务错误类型
//!
//! 在共享库 WelcomeError 基础上定义本服务特有的错误变体，
//! 区分"解码失败（消息丢弃）"与"发送失败（消息丢弃，但原因在下游）"，
//! 便于消费循环按类别记录日志。

use welcome_shared::error::WelcomeError;

/// 欢迎邮件处理错误
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// 消息负载不是合法的注册事件 JSON，事件被丢弃
    #[error("注册事件解码失败: {0}")]
    DecodeFailed(String),

    /// 事件缺少收件人地址，无法投递
    #[error("收件人地址为空: user_id={user_id}")]
    EmptyRecipient { user_id: i64 },

    /// SMTP 投递失败（认证、连接或收件人被拒），事件被丢弃
    #[error("邮件发送失败: {reason}")]
    SendFailed { reason: String },

    /// 透传共享库错误，避免在每个 match 分支手动转换
    #[error(transparent)]
    Shared(#[from] WelcomeError),
}
