//! Pending-wait table: correlation id -> one-shot resolution handle.
//!
//! An entry is inserted when a request is sent and removed exactly once,
//! by whichever of {matching response, deadline expiry, send failure} comes
//! first. `DashMap::remove` is the single-winner point: the loser finds no
//! entry and becomes a no-op, so a response and a timeout racing on the same
//! id can never both resolve the check.

use dashmap::DashMap;
use tokio::sync::oneshot;

use vetogate_core::protocol::DecisionResponse;

#[derive(Default)]
pub struct PendingWaits {
    waits: DashMap<String, oneshot::Sender<DecisionResponse>>,
}

impl PendingWaits {
    pub fn new() -> Self {
        Self {
            waits: DashMap::new(),
        }
    }

    /// Register a wait for `id`. The returned receiver fires at most once.
    pub fn register(&self, id: &str) -> oneshot::Receiver<DecisionResponse> {
        let (tx, rx) = oneshot::channel();
        self.waits.insert(id.to_string(), tx);
        rx
    }

    /// Resolve the wait for `resp.request_id`, if it still exists.
    /// Returns false for late or unknown responses (a no-op by contract).
    pub fn resolve(&self, resp: DecisionResponse) -> bool {
        match self.waits.remove(&resp.request_id) {
            // send fails only if the waiter already gave up; still resolved.
            Some((_, tx)) => tx.send(resp).is_ok(),
            None => false,
        }
    }

    /// Drop the wait for `id` without resolving it (timeout / send failure).
    pub fn abandon(&self, id: &str) -> bool {
        self.waits.remove(id).is_some()
    }

    /// Number of in-flight waits.
    pub fn len(&self) -> usize {
        self.waits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }
}
