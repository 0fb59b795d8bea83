//! Route modules for the Text Coordinates server

pub mod extract;
pub mod health;

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::PipelineError;
use crate::pipeline::ResponseEnvelope;
use crate::state::AppState;
use crate::upload::MULTIPART_SLACK_BYTES;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config()
        .upload
        .max_bytes
        .saturating_add(MULTIPART_SLACK_BYTES);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(extract::router(body_limit))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<ResponseEnvelope>) {
    (StatusCode::NOT_FOUND, Json(ResponseEnvelope::failure("Not found")))
}

/// Turn a handler panic into the generic 500 envelope
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    PipelineError::Internal(format!("Handler panicked: {}", detail)).into_response()
}
