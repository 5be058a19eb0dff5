//! Keep-alive HTTP server.
//!
//! Lets an external uptime pinger keep the host awake and exposes a small health report.

use axum::{extract::State, routing::get, Json, Router};
use p2p_alerts::AlertRegistry;
use p2p_feeds::OfferFetcher;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// State shared with the HTTP handlers.
#[derive(Clone)]
pub struct KeepAliveState {
    started_at: Instant,
    registry: Arc<AlertRegistry>,
    fetcher: Arc<OfferFetcher>,
}

impl KeepAliveState {
    pub fn new(registry: Arc<AlertRegistry>, fetcher: Arc<OfferFetcher>) -> Self {
        Self {
            started_at: Instant::now(),
            registry,
            fetcher,
        }
    }
}

/// Health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub active_alerts: usize,
    pub upstream_calls: u64,
    pub upstream_failures: u64,
    pub cache_hits: u64,
}

async fn alive() -> &'static str {
    "Bot is alive"
}

async fn health(State(state): State<KeepAliveState>) -> Json<HealthReport> {
    let stats = state.fetcher.stats();
    Json(HealthReport {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        active_alerts: state.registry.len(),
        upstream_calls: stats.upstream_calls,
        upstream_failures: stats.failures,
        cache_hits: stats.cache_hits,
    })
}

pub fn create_router(state: KeepAliveState) -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind and serve in the background.
pub async fn start_keep_alive_server(
    state: KeepAliveState,
    port: u16,
) -> Result<tokio::task::JoinHandle<()>, std::io::Error> {
    let app = create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Keep-alive server listening on http://0.0.0.0:{}", port);

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Keep-alive server error: {}", e);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p2p_core::UserId;
    use p2p_feeds::{BybitConfig, BybitP2pClient, CachePolicy};
    use rust_decimal::Decimal;

    fn state() -> KeepAliveState {
        let client = BybitP2pClient::new(BybitConfig::default()).unwrap();
        let fetcher = Arc::new(OfferFetcher::new(Arc::new(client), CachePolicy::default()));
        KeepAliveState::new(Arc::new(AlertRegistry::new()), fetcher)
    }

    async fn serve(state: KeepAliveState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_alive() {
        let base = serve(state()).await;
        let body = reqwest::get(&base).await.unwrap().text().await.unwrap();
        assert_eq!(body, "Bot is alive");
    }

    #[tokio::test]
    async fn test_health_reports_alerts() {
        let state = state();
        state.registry.set_alert(UserId(1), Decimal::from(530));
        state.registry.set_alert(UserId(2), Decimal::from(520));
        let base = serve(state).await;

        let report: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(report["status"], "ok");
        assert_eq!(report["active_alerts"], 2);
        assert_eq!(report["upstream_calls"], 0);
    }
}
