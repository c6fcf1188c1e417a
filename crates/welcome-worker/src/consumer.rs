//! 欢迎邮件消费者
//!
//! 从 Kafka 消费用户注册事件，解码后生成欢迎邮件并交给发送器投递。
//! 管道为尽力而为：解码失败、收件人为空或投递失败都只记录日志后丢弃事件，
//! 循环继续处理下一条消息，不做重试也不回滚偏移量。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use welcome_shared::config::AppConfig;
use welcome_shared::kafka::{ConsumerMessage, KafkaConsumer};

use crate::error::WorkerError;
use crate::event;
use crate::sender::DeliverySender;
use crate::templates;

/// 欢迎邮件消费者
///
/// 组合 KafkaConsumer（消息拉取）与 DeliverySender（邮件投递），
/// 形成 poll -> decode -> compose -> send 的完整消费管道。
pub struct WelcomeConsumer {
    consumer: KafkaConsumer,
    topic: String,
    sender: Arc<dyn DeliverySender>,
}

impl WelcomeConsumer {
    pub fn new(config: &AppConfig, sender: Arc<dyn DeliverySender>) -> Result<Self, WorkerError> {
        let consumer = KafkaConsumer::new(&config.kafka)?;
        Ok(Self {
            consumer,
            topic: config.kafka.topic.clone(),
            sender,
        })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    ///
    /// 订阅失败（启动阶段）向上传播并终止进程；进入循环后
    /// 单条消息的任何失败都被就地消化。
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), WorkerError> {
        self.consumer.subscribe(&[&self.topic])?;

        info!(topic = %self.topic, "欢迎邮件消费者已启动");

        let sender = self.sender;

        self.consumer
            .start(shutdown, |msg| {
                let sender = &sender;
                async move {
                    if let Err(e) = handle_message(sender.as_ref(), &msg).await {
                        error!(
                            error = %e,
                            topic = %msg.topic,
                            partition = msg.partition,
                            offset = msg.offset,
                            "处理注册事件失败，消息已丢弃"
                        );
                    }
                    Ok(())
                }
            })
            .await;

        info!("欢迎邮件消费者已停止");
        Ok(())
    }
}

/// 处理单条注册事件消息
///
/// 拆分为独立函数而非方法，便于在测试中直接调用而无需构造完整的 Consumer。
/// 流程：解码 -> 校验收件人非空 -> 生成邮件 -> 投递 -> 记录结果。
pub async fn handle_message(
    sender: &dyn DeliverySender,
    msg: &ConsumerMessage,
) -> Result<(), WorkerError> {
    let user = event::decode(&msg.payload)?;

    info!(
        user_id = user.id,
        email = %user.email,
        role = %user.role,
        offset = msg.offset,
        "收到用户注册事件"
    );

    // 唯一的收件人校验：空地址无法投递，其余交给 SMTP 传输判断
    if user.email.is_empty() {
        return Err(WorkerError::EmptyRecipient { user_id: user.id });
    }

    let message = templates::compose(&user);
    sender.send(&message, &user.email).await?;

    info!(
        recipient = %user.email,
        user_id = user.id,
        role = %user.role,
        "欢迎邮件已发送"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::MockDeliverySender;

    /// 构造测试用的 Kafka 消息
    fn make_message(payload: &[u8]) -> ConsumerMessage {
        ConsumerMessage {
            topic: "new-user".to_string(),
            partition: 0,
            offset: 1,
            key: None,
            payload: payload.to_vec(),
            timestamp: Some(1_700_000_000_000),
        }
    }

    fn ada_payload() -> &'static [u8] {
        br#"{
            "id": 42,
            "full_name": "Ada Lovelace",
            "email": "ada@example.com",
            "address": "12 Analytical St",
            "registration_date": "2024-06-01T08:30:00Z",
            "role": "admin"
        }"#
    }

    #[tokio::test]
    async fn test_handle_valid_event_sends_email() {
        let mut sender = MockDeliverySender::new();
        sender
            .expect_send()
            .withf(|message, to| {
                to == "ada@example.com"
                    && message.subject == "Account created!"
                    && message.body.contains("Dear Ada Lovelace")
                    && message.body.contains("42")
                    && message.body.contains("admin")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let msg = make_message(ada_payload());
        assert!(handle_message(&sender, &msg).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_malformed_payload_never_invokes_sender() {
        let mut sender = MockDeliverySender::new();
        sender.expect_send().times(0);

        let msg = make_message(b"definitely not a registration event");
        let result = handle_message(&sender, &msg).await;
        assert!(matches!(result, Err(WorkerError::DecodeFailed(_))));
    }

    #[tokio::test]
    async fn test_handle_delivery_failure_no_retry() {
        let mut sender = MockDeliverySender::new();
        // times(1) 同时验证了"不重试"：投递失败后不得再次调用发送器
        sender.expect_send().times(1).returning(|_, _| {
            Err(WorkerError::SendFailed {
                reason: "连接被拒绝".to_string(),
            })
        });

        let msg = make_message(ada_payload());
        let result = handle_message(&sender, &msg).await;
        assert!(matches!(result, Err(WorkerError::SendFailed { .. })));
    }

    #[tokio::test]
    async fn test_handle_empty_recipient_dropped() {
        let mut sender = MockDeliverySender::new();
        sender.expect_send().times(0);

        let msg = make_message(br#"{"id": 9, "full_name": "Bob", "role": "user"}"#);
        let result = handle_message(&sender, &msg).await;
        assert!(matches!(
            result,
            Err(WorkerError::EmptyRecipient { user_id: 9 })
        ));
    }

    #[tokio::test]
    async fn test_handle_redelivered_event_sends_twice() {
        // 至少一次语义下同一事件可能被重复投递：两次处理产生两次独立发送
        let mut sender = MockDeliverySender::new();
        sender
            .expect_send()
            .withf(|_, to| to == "ada@example.com")
            .times(2)
            .returning(|_, _| Ok(()));

        let msg = make_message(ada_payload());
        assert!(handle_message(&sender, &msg).await.is_ok());
        assert!(handle_message(&sender, &msg).await.is_ok());
    }
}
