//! Identity-state events
//!
//! The identity provider's session state is exposed as an observable
//! stream: subscribers receive the current state immediately on
//! subscription plus every subsequent transition. Backed by a
//! `tokio::sync::watch` channel, so late subscribers never miss the
//! latest state and slow subscribers only ever see the newest value.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Current identity-provider session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IdentityState {
    SignedOut,
    SignedIn { uid: String, email: String },
}

impl IdentityState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, IdentityState::SignedIn { .. })
    }
}

/// Broadcast bus for identity-state transitions
#[derive(Debug, Clone)]
pub struct IdentityBus {
    tx: watch::Sender<IdentityState>,
}

impl IdentityBus {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(IdentityState::SignedOut);
        Self { tx }
    }

    /// Publish a transition to all subscribers
    pub fn publish(&self, state: IdentityState) {
        // send_replace never fails even with zero subscribers
        self.tx.send_replace(state);
    }

    /// Subscribe; the receiver yields the current state first
    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.tx.subscribe()
    }

    /// Snapshot of the current state
    pub fn current(&self) -> IdentityState {
        self.tx.borrow().clone()
    }
}

impl Default for IdentityBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_sees_current_state_immediately() {
        let bus = IdentityBus::new();
        bus.publish(IdentityState::SignedIn {
            uid: "u1".into(),
            email: "a@example.com".into(),
        });

        let rx = bus.subscribe();
        assert!(rx.borrow().is_signed_in());
    }

    #[tokio::test]
    async fn subscriber_receives_transitions() {
        let bus = IdentityBus::new();
        let mut rx = bus.subscribe();
        assert_eq!(*rx.borrow_and_update(), IdentityState::SignedOut);

        bus.publish(IdentityState::SignedIn {
            uid: "u1".into(),
            email: "a@example.com".into(),
        });
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_signed_in());

        bus.publish(IdentityState::SignedOut);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), IdentityState::SignedOut);
    }
}
