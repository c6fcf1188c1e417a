//! Kafka 基础设施封装
//!
//! 将 rdkafka 的底层 API 封装为业务友好的 Consumer 抽象，
//! 统一连接配置、错误映射和优雅关闭语义，避免消费逻辑中混入样板代码。

use futures::Stream;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Message};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::KafkaConfig;
use crate::error::WelcomeError;

// ---------------------------------------------------------------------------
// ConsumerMessage
// ---------------------------------------------------------------------------

/// 消费到的 Kafka 消息的统一表示
///
/// 将 rdkafka 的 `BorrowedMessage`（带生命周期约束）转换为拥有所有权的结构体，
/// 使消息可以安全地跨 await 点传递给异步处理函数。
#[derive(Debug, Clone)]
pub struct ConsumerMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub timestamp: Option<i64>,
}

impl ConsumerMessage {
    /// 从 rdkafka 的借用消息构造，提取并拥有所有字段
    fn from_borrowed(msg: &BorrowedMessage<'_>) -> Self {
        let key = msg
            .key()
            .and_then(|k| std::str::from_utf8(k).ok())
            .map(String::from);

        let payload = msg.payload().map(|p| p.to_vec()).unwrap_or_default();

        Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key,
            payload,
            timestamp: msg.timestamp().to_millis(),
        }
    }
}

// ---------------------------------------------------------------------------
// KafkaConsumer
// ---------------------------------------------------------------------------

/// 面向业务的 Kafka 消费者
///
/// 封装 `StreamConsumer` 并提供基于 `watch` channel 的优雅关闭语义。
/// 偏移量由 rdkafka 自动提交（at-least-once）：崩溃重启后同一事件
/// 可能被重新投递，由消费逻辑保证重复处理无副作用放大。
pub struct KafkaConsumer {
    consumer: StreamConsumer,
}

impl KafkaConsumer {
    /// 创建消费者
    ///
    /// 配置了用户名/密码时启用 SASL/SCRAM-SHA-256 + TLS
    /// （托管 Kafka 服务的标准接入方式），否则使用明文连接。
    pub fn new(config: &KafkaConfig) -> Result<Self, WelcomeError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("enable.auto.commit", "true");

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanisms", "SCRAM-SHA-256")
                .set("sasl.username", username)
                .set("sasl.password", password);
        }

        let consumer: StreamConsumer = client_config
            .create()
            .map_err(|e| WelcomeError::Kafka(format!("创建消费者失败: {e}")))?;

        info!(
            brokers = %config.brokers,
            group_id = %config.consumer_group,
            "Kafka 消费者已初始化"
        );
        Ok(Self { consumer })
    }

    /// 订阅指定的 topic 列表
    pub fn subscribe(&self, topics: &[&str]) -> Result<(), WelcomeError> {
        self.consumer
            .subscribe(topics)
            .map_err(|e| WelcomeError::Kafka(format!("订阅 topic 失败: {e}")))?;

        info!(?topics, "已订阅 Kafka topics");
        Ok(())
    }

    /// 启动消费循环
    ///
    /// 将 rdkafka 消息流转换为拥有所有权的 `ConsumerMessage` 流后
    /// 交给 `run_loop` 驱动，直到收到关闭信号或消息流结束。
    pub async fn start<F, Fut>(self, shutdown: watch::Receiver<bool>, handler: F)
    where
        F: Fn(ConsumerMessage) -> Fut,
        Fut: std::future::Future<Output = Result<(), WelcomeError>>,
    {
        use futures::StreamExt;

        let stream = self
            .consumer
            .stream()
            .map(|result| result.map(|msg| ConsumerMessage::from_borrowed(&msg)));

        info!("Kafka 消费循环已启动");
        run_loop(stream, shutdown, handler).await;
    }
}

/// 驱动消费循环直到关闭信号或消息流结束
///
/// 与具体的 rdkafka 消费者解耦，便于在测试中注入合成消息流。
/// 使用 `tokio::select!` 同时监听消息流和关闭信号：
/// - 收到消息时调用 handler 处理；handler 返回错误只记录日志而不中断循环，
///   避免单条坏消息导致整个消费者停止。
/// - 瞬时读取错误同样只记录日志，下一轮继续拉取。
/// - 关闭信号变为 `true` 时退出循环，确保正在执行的 handler 能自然完成。
async fn run_loop<S, F, Fut>(stream: S, mut shutdown: watch::Receiver<bool>, handler: F)
where
    S: Stream<Item = Result<ConsumerMessage, KafkaError>>,
    F: Fn(ConsumerMessage) -> Fut,
    Fut: std::future::Future<Output = Result<(), WelcomeError>>,
{
    use futures::StreamExt;

    futures::pin_mut!(stream);

    loop {
        tokio::select! {
            // 偏向关闭信号，保证收到关闭时能尽快退出
            biased;

            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("收到关闭信号，Kafka 消费循环退出");
                    break;
                }
            }

            msg_result = stream.next() => {
                let Some(msg_result) = msg_result else {
                    warn!("Kafka 消息流意外结束");
                    break;
                };

                match msg_result {
                    Ok(msg) => {
                        debug!(
                            topic = %msg.topic,
                            partition = msg.partition,
                            offset = msg.offset,
                            "收到 Kafka 消息"
                        );

                        if let Err(e) = handler(msg).await {
                            error!(error = %e, "处理 Kafka 消息失败");
                        }
                    }
                    Err(e) => {
                        // 瞬时读取错误，不影响后续消息
                        error!(error = %e, "接收 Kafka 消息出错");
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 测试
// ---------------------------------------------------------------------------
