//! 邮件投递发送器
//!
//! 通过 `DeliverySender` trait 抽象投递行为：消费管道只依赖
//! "把一封邮件交给某个收件人"这一窄接口，具体传输（SMTP）在启动时注入。
//! 发送器自身不做任何重试，失败由消费循环记录日志后丢弃。

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;
use welcome_shared::config::SmtpConfig;
use welcome_shared::error::WelcomeError;

use crate::error::WorkerError;
use crate::templates::WelcomeMessage;

/// 邮件投递 trait
///
/// 收件人地址与邮件内容分离传递：内容由模板生成，
/// 地址直接来自注册事件且不做格式校验，非法地址由传输层拒绝。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliverySender: Send + Sync {
    /// 向指定收件人投递一封邮件，阻塞至一次网络往返完成
    async fn send(&self, message: &WelcomeMessage, to: &str) -> Result<(), WorkerError>;
}

/// 基于 lettre 的 SMTP 发送器
///
/// 使用 PLAIN 认证连接 `smtp.server:smtp.port`，发件人地址同时作为认证用户名。
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// 根据配置构建 SMTP 传输
    ///
    /// 传输构建或发件人地址解析失败属于启动阶段的致命错误，
    /// 由调用方直接终止进程。
    pub fn new(config: &SmtpConfig) -> Result<Self, WorkerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
            .map_err(|e| WelcomeError::Smtp(format!("构建 SMTP 传输失败: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.email.clone(),
                config.password.clone(),
            ))
            .build();

        let from = config
            .email
            .parse::<Mailbox>()
            .map_err(|e| WelcomeError::Smtp(format!("发件人地址非法: {e}")))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl DeliverySender for SmtpSender {
    async fn send(&self, message: &WelcomeMessage, to: &str) -> Result<(), WorkerError> {
        // 收件人地址来自事件原文，解析失败与传输拒绝同等对待
        let to_mailbox = to.parse::<Mailbox>().map_err(|e| WorkerError::SendFailed {
            reason: format!("收件人地址非法: {e}"),
        })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| WorkerError::SendFailed {
                reason: format!("构建邮件失败: {e}"),
            })?;

        self.transport
            .send(email)
            .await
            .map_err(|e| WorkerError::SendFailed {
                reason: e.to_string(),
            })?;

        info!(recipient = %to, "欢迎邮件已投递");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> SmtpConfig {
        SmtpConfig {
            server: "smtp.example.com".to_string(),
            port: 587,
            email: "noreply@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_smtp_sender_build() {
        // 构建传输不触发网络连接
        assert!(SmtpSender::new(&make_config()).is_ok());
    }

    #[test]
    fn test_smtp_sender_invalid_from_address() {
        let mut config = make_config();
        config.email = "不是邮箱地址".to_string();
        assert!(SmtpSender::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_send_invalid_recipient_fails_before_network() {
        let sender = SmtpSender::new(&make_config()).unwrap();
        let message = WelcomeMessage {
            subject: "Account created!".to_string(),
            body: "Dear X".to_string(),
        };

        // 收件人解析在任何网络 IO 之前失败
        let result = sender.send(&message, "not an address").await;
        assert!(matches!(result, Err(WorkerError::SendFailed { .. })));
    }
}
