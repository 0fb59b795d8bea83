//! Health check endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub engine: &'static str,
    pub engine_available: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ocr = state.pipeline().ocr();
    let engine_available = ocr.is_available().await;

    Json(HealthResponse {
        status: if engine_available { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        service: "textcoords-server",
        engine: ocr.engine_name(),
        engine_available,
    })
}
