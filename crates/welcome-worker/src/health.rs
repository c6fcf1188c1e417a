//! 存活探针
//!
//! 单一 `/health` 路由，进程存活即返回 ok。
//! 只反映进程本身是否在运行，不反映消费管道的健康状况，
//! 与消费循环不共享任何可变状态。

use axum::{Json, Router, routing::get};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// 构建存活探针路由
pub fn router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// 存活探针：服务进程正常即返回 ok
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "welcome-worker"
    }))
}

/// 启动存活探针 HTTP 服务
///
/// 收到 shutdown 信号后通过 axum 的优雅关闭流程退出。
pub async fn serve(addr: String, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "存活探针已启动");

    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
            info!("存活探针退出");
        })
        .await?;

    Ok(())
}
