//! Filtered search endpoint

use axum::extract::State;
use axum::Json;
use sdir_common::{filter::filter_and_sort, FilterSpec, StudentRecord};

use crate::error::ApiResult;
use crate::AppState;

/// POST /api/search
///
/// Fetches the full record set and applies the filter-sort engine locally;
/// store failures propagate verbatim.
pub async fn search(
    State(state): State<AppState>,
    Json(spec): Json<FilterSpec>,
) -> ApiResult<Json<Vec<StudentRecord>>> {
    let records = state.store.list_all().await?;
    Ok(Json(filter_and_sort(&records, &spec)))
}
