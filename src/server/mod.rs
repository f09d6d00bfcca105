// HTTP façade over the workflow
//
// - POST /generate: multipart upload, runs the pipeline
// - GET /download, /subtitle, /video: serve processed artifacts
// - GET /health

pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::workflow::Workflow;

pub use handlers::*;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<Workflow>,
}

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/generate", post(generate_handler))
        .route("/download/:filename", get(download_handler))
        .route("/subtitle/:filename", get(subtitle_handler))
        .route("/video/:filename", get(video_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(trace_layer)
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve(workflow: Arc<Workflow>, config: &ServerConfig) -> Result<()> {
    let app = create_router(AppState { workflow }, config.max_upload_bytes);

    let addr = format!("{}:{}", config.address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
