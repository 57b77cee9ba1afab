//! Identity-state event stream

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /api/events - SSE stream of identity-state transitions
pub async fn identity_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sdir_common::sse::identity_sse_stream("sdir-web", state.identity_bus.subscribe())
}
