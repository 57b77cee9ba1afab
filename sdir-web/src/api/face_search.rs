//! Photo-based student lookup

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::services::face::FaceMatch;
use crate::AppState;

/// GET /api/search/photo/status
///
/// Whether photo search is usable with the current configuration.
pub async fn photo_search_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "available": state.face.is_some() }))
}

/// POST /api/search/photo
///
/// Body is the raw image. Unavailable (503) when vision credentials are not
/// configured; the feature degrades rather than blocking startup.
pub async fn photo_search(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Vec<FaceMatch>>> {
    let face = state.face.as_ref().ok_or_else(|| {
        ApiError::VisionUnavailable("photo search is not configured".to_string())
    })?;

    if body.is_empty() {
        return Err(ApiError::Validation("an image payload is required".to_string()));
    }

    let records = state.store.list_all().await?;
    let matches = face.find_similar_students(&body, &records).await?;
    Ok(Json(matches))
}
