mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::config::KioskConfig;
use crate::engine::SharedLedger;

#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    pub config: Arc<KioskConfig>,
}

impl AppState {
    pub fn new(ledger: SharedLedger, config: KioskConfig) -> Self {
        Self {
            ledger,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/dashboard", get(handlers::dashboard))
        .route("/readycard/balance/:pan", get(handlers::balance))
        .route("/readycard/reload/:pan", post(handlers::reload))
        .route("/cash-load", get(handlers::cash_load))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

pub async fn run(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.server.addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(listen = %addr, "kiosk api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
