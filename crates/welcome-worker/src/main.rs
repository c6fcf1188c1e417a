//! 欢迎邮件服务入口
//!
//! 启动顺序：加载配置 -> 初始化日志 -> 构建 SMTP 发送器与 Kafka 消费者
//! -> 启动存活探针与信号监听 -> 进入消费循环。
//! 任何启动阶段的失败直接以非零码退出；进入循环后进程只因关闭信号终止。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use welcome_shared::{config::AppConfig, observability};
use welcome_worker::{consumer::WelcomeConsumer, health, sender::SmtpSender};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("welcome-worker")?;
    observability::init(&config.observability)?;

    info!("Starting welcome-worker on {}", config.server_addr());

    let sender: Arc<SmtpSender> = Arc::new(SmtpSender::new(&config.smtp)?);
    let consumer = WelcomeConsumer::new(&config, sender)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 存活探针与消费循环不共享状态，放在独立任务中运行
    let health_addr = config.server_addr();
    let health_shutdown = shutdown_rx.clone();
    let health_task = tokio::spawn(async move {
        if let Err(e) = health::serve(health_addr, health_shutdown).await {
            error!(error = %e, "存活探针异常退出");
        }
    });

    // 信号监听：收到 SIGTERM 或 Ctrl+C 后广播关闭信号
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(true);
    });

    let result = consumer.run(shutdown_rx).await;

    // 消费循环无论因何退出（关闭信号或消息流结束）都广播关闭，
    // 避免存活探针在消费已死的进程里继续上报 ok
    let _ = shutdown_tx.send(true);
    let _ = health_task.await;

    info!("welcome-worker 已退出");
    result?;
    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
/// 收到任一信号后返回，触发消费循环与存活探针的优雅关闭。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
