//! Server-Sent Events (SSE) utilities
//!
//! Streams identity-state transitions to browser clients, with periodic
//! heartbeats for connection status monitoring.

use crate::events::IdentityState;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Create an SSE stream of identity-state events.
///
/// The current state is delivered immediately on connect; afterwards every
/// transition is forwarded, interleaved with heartbeat comments.
pub fn identity_sse_stream(
    service_name: &'static str,
    mut rx: watch::Receiver<IdentityState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} identity events", service_name);

    let stream = async_stream::stream! {
        // Initial snapshot so late subscribers start from the live state
        let current = rx.borrow_and_update().clone();
        yield Ok(identity_event(&current));

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        // Bus dropped; end the stream
                        break;
                    }
                    let state = rx.borrow_and_update().clone();
                    debug!("SSE: forwarding identity transition");
                    yield Ok(identity_event(&state));
                }
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

fn identity_event(state: &IdentityState) -> Event {
    let data = serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string());
    Event::default().event("IdentityState").data(data)
}
