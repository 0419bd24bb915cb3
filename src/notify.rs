//! Row-change notification interface.
//!
//! The ledger and tracker publish a logical event for every mutation so
//! interested readers can re-fetch the affected court instead of polling.
//! Delivery fan-out (websocket, SSE, broker) is a transport concern layered
//! on top of `subscribe`; the only promise here is that a subscriber who
//! re-reads after receiving an event sees state at least as new as the
//! mutation that produced it.

use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Reservation,
    Checkin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub entity: Entity,
    pub court_id: String,
    pub op: Op,
}

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a change. Dropped silently when nobody is subscribed.
    pub fn publish(&self, entity: Entity, court_id: &str, op: Op) {
        let event = ChangeEvent {
            entity,
            court_id: court_id.to_string(),
            op,
        };
        tracing::debug!(?event, "change published");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}
