//! Text extraction route
//!
//! Endpoints:
//! - POST /api/extractTextCoordinates - multipart field `image`, returns
//!   recognized text plus per-word bounding boxes

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::pipeline::{ResponseEnvelope, Stage};
use crate::state::AppState;
use crate::upload;

/// Create the extract router
pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/api/extractTextCoordinates", post(extract_text_coordinates))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// POST /api/extractTextCoordinates
async fn extract_text_coordinates(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResponseEnvelope>, PipelineError> {
    let request_id = Uuid::new_v4();

    async move {
        let pipeline = state.pipeline();

        let image = upload::read_image(multipart, pipeline.policy()).await?;
        let projection = pipeline.run(image).await?;

        tracing::info!(
            stage = %Stage::Responded,
            words = projection.words.len(),
            "Text extracted"
        );

        Ok(Json(ResponseEnvelope::success(projection)))
    }
    .instrument(tracing::info_span!("extract", %request_id))
    .await
}
