//! Heuristic match-ranking endpoint

use axum::extract::State;
use axum::Json;
use chrono::Datelike;
use sdir_common::{rank::RankedResult, RankQuery};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/search/ai
///
/// Ranks all registered students against the query. A store failure here is
/// reported as a ranking failure wrapping the cause, not a bare store error.
pub async fn ai_search(
    State(state): State<AppState>,
    Json(query): Json<RankQuery>,
) -> ApiResult<Json<Vec<RankedResult>>> {
    let records = state
        .store
        .list_all()
        .await
        .map_err(|e| ApiError::RankingFailed(e.to_string()))?;

    let current_year = chrono::Utc::now().year();
    let ranked = state.ranker.rank(&records, &query, current_year);
    Ok(Json(ranked))
}
