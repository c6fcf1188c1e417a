//! 统一错误处理模块
//!
//! 定义基础设施层共享的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum WelcomeError {
    // ==================== Kafka 错误 ====================
    #[error("Kafka 错误: {0}")]
    Kafka(String),

    // ==================== SMTP 错误 ====================
    #[error("SMTP 错误: {0}")]
    Smtp(String),

    // ==================== 配置错误 ====================
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    // ==================== 通用错误 ====================
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, WelcomeError>;

impl WelcomeError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Kafka(_) => "KAFKA_ERROR",
            Self::Smtp(_) => "SMTP_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为瞬时错误
    ///
    /// 瞬时错误（broker 抖动、SMTP 连接失败）只记录日志后继续消费；
    /// 配置错误发生在启动阶段，属于不可恢复的致命错误。
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Kafka(_) | Self::Smtp(_))
    }
}
