//! Demo HTTP server wired with APM instrumentation.
//!
//! # Responsibilities
//! - Create the axum Router with the sample handlers
//! - Wire up middleware (APM, timeout, request tracing)
//! - Serve until the shutdown future resolves

use std::future::Future;
use std::time::Duration;

use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::annotate::end_span;
use crate::backend::Backend;
use crate::config::AppConfig;
use crate::context::Apm;
use crate::middleware::ApmLayer;

/// Build the router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, backend: &dyn Backend) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users/{id}", get(get_user))
        .route("/fail", get(fail))
        .layer(ApmLayer::new(config.apm.clone(), backend))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Shutdown signal received");
}

async fn health() -> &'static str {
    "ok"
}

async fn get_user(apm: Apm, Path(id): Path<u64>) -> Json<Value> {
    apm.set_label("user_id", &id.to_string());

    let span = apm.start_span("db.query");
    let user = json!({ "id": id, "name": format!("user-{}", id) });
    end_span(span);

    Json(user)
}

async fn fail(apm: Apm) -> (StatusCode, &'static str) {
    apm.notice_error("simulated failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "simulated failure")
}
