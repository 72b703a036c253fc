//! Checkpoint service: the synchronous allow/deny contract.
//!
//! Per inbound check: Received -> AwaitingDecision -> one of
//! {Approved, Denied(declined), Denied(timeout), Denied(send failure)}.
//! The deadline is a purely local timeout; nothing is sent to retract a
//! request, and a decision arriving after the deadline is discarded rather
//! than retroactively changing the returned verdict.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::time::{Duration, Instant};
use uuid::Uuid;

use vetogate_core::protocol::DecisionRequest;

use crate::relay::RelayClient;

/// Attributes extracted from the inbound request being checked.
#[derive(Debug, Clone)]
pub struct CheckAttributes {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
}

/// Why a check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The decision surface said no.
    Declined,
    /// No decision arrived within the deadline.
    Timeout,
    /// The request never reached the relay (retries exhausted).
    SendFailure,
}

/// Binary verdict returned to the enforcement proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

impl Verdict {
    pub fn allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

pub struct CheckpointService {
    client: Arc<RelayClient>,
    deadline: Duration,
}

impl CheckpointService {
    /// Default decision deadline.
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

    pub fn new(client: Arc<RelayClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    pub fn client(&self) -> &Arc<RelayClient> {
        &self.client
    }

    /// Ask the decision surface about one inbound request and wait for the
    /// verdict, up to the deadline. Every failure mode denies.
    ///
    /// Concurrent checks are independent: each gets its own correlation id
    /// and pending wait, and resolution order follows response arrival, not
    /// send order.
    pub async fn check(&self, attrs: CheckAttributes) -> Verdict {
        let req = DecisionRequest {
            id: Uuid::new_v4().to_string(),
            method: attrs.method,
            path: attrs.path,
            headers: attrs.headers,
        };
        let started = Instant::now();
        tracing::info!(request_id = %req.id, method = %req.method, path = %req.path, "check received");

        let rx = match self.client.send_request(&req).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!(request_id = %req.id, error = %e, "relay unreachable; denying");
                return Verdict::Deny(DenyReason::SendFailure);
            }
        };

        match tokio::time::timeout(self.deadline, rx).await {
            Ok(Ok(resp)) => {
                tracing::info!(
                    request_id = %req.id,
                    approved = resp.approved,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "decision received"
                );
                if resp.approved {
                    Verdict::Allow
                } else {
                    Verdict::Deny(DenyReason::Declined)
                }
            }
            // Resolution handle dropped without a decision: the entry was
            // abandoned out from under us. Fail closed.
            Ok(Err(_)) => {
                tracing::warn!(request_id = %req.id, "wait abandoned; denying");
                Verdict::Deny(DenyReason::SendFailure)
            }
            Err(_) => {
                // Deadline fired first: remove the wait so a late response
                // becomes a no-op and the table cannot grow unbounded.
                self.client.abandon_wait(&req.id);
                tracing::info!(
                    request_id = %req.id,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "no decision within deadline; denying"
                );
                Verdict::Deny(DenyReason::Timeout)
            }
        }
    }
}
