//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use docsphere_agent::DocBot;
use docsphere_core::config::GatewayConfig;
use docsphere_store::IngestionPipeline;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
    pub bot: Arc<DocBot>,
    pub start_time: std::time::Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/upload_document", post(super::routes::upload_document))
        .route("/get_answer", get(super::routes::get_answer))
        .route("/health", get(super::routes::health_check))
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server.
pub async fn start(
    config: &GatewayConfig,
    pipeline: Arc<IngestionPipeline>,
    bot: Arc<DocBot>,
) -> anyhow::Result<()> {
    let app = build_router(AppState {
        pipeline,
        bot,
        start_time: std::time::Instant::now(),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
