//! Tenant registry: namespace table and per-tenant connection slots.
//!
//! A namespace is created lazily on first connection and lives for the
//! broker's lifetime; its two slots (upstream/downstream) come and go
//! independently. Every claim carries a broker-wide sequence number so a
//! stale disconnect can never clear a slot that a newer connection already
//! owns: two peers racing for the same slot get exactly one winner, and the
//! loser's cleanup is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Which end of a tenant's pair a connection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Checkpoint / relay-client end.
    Upstream,
    /// Decision-surface end.
    Downstream,
}

impl Side {
    pub fn peer(self) -> Side {
        match self {
            Side::Upstream => Side::Downstream,
            Side::Downstream => Side::Upstream,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Upstream => "upstream",
            Side::Downstream => "downstream",
        }
    }
}

/// One slot occupant: the connection's outbound queue plus its claim seq.
#[derive(Clone)]
pub struct SlotConn {
    pub seq: u64,
    pub tx: mpsc::Sender<Message>,
}

/// One tenant namespace: at most one connection per side.
#[derive(Default)]
pub struct Tenant {
    slots: DashMap<Side, SlotConn>,
}

impl Tenant {
    /// Install `conn` as the side's occupant. Returns the evicted previous
    /// occupant, if any; dropping its sender closes that session's loop.
    pub fn claim(&self, side: Side, conn: SlotConn) -> Option<SlotConn> {
        self.slots.insert(side, conn)
    }

    /// Clear the slot, but only if `seq` is still the current occupant.
    /// Returns whether anything was removed.
    pub fn clear_if_current(&self, side: Side, seq: u64) -> bool {
        self.slots.remove_if(&side, |_, c| c.seq == seq).is_some()
    }

    /// Snapshot the given side's outbound queue, if that peer is connected.
    pub fn sender(&self, side: Side) -> Option<mpsc::Sender<Message>> {
        self.slots.get(&side).map(|c| c.tx.clone())
    }
}

/// Broker-process-lifetime table of tenant namespaces.
#[derive(Default)]
pub struct TenantRegistry {
    tenants: DashMap<String, Arc<Tenant>>,
    seq: AtomicU64,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self {
            tenants: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Fetch-or-create the namespace for a tenant identity.
    pub fn tenant(&self, tenant_id: &str) -> Arc<Tenant> {
        self.tenants
            .entry(tenant_id.to_string())
            .or_default()
            .clone()
    }

    /// Next broker-wide claim sequence number.
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(seq: u64) -> (SlotConn, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(4);
        (SlotConn { seq, tx }, rx)
    }

    #[test]
    fn namespace_is_created_lazily_and_reused() {
        let reg = TenantRegistry::new();
        assert_eq!(reg.tenant_count(), 0);

        let a = reg.tenant("aaaa");
        let a_again = reg.tenant("aaaa");
        assert!(Arc::ptr_eq(&a, &a_again));
        assert_eq!(reg.tenant_count(), 1);
    }

    #[test]
    fn claim_evicts_previous_occupant() {
        let tenant = Tenant::default();
        let (first, _rx1) = conn(1);
        let (second, _rx2) = conn(2);

        assert!(tenant.claim(Side::Downstream, first).is_none());
        let evicted = tenant.claim(Side::Downstream, second);
        assert_eq!(evicted.map(|c| c.seq), Some(1));
        // upstream slot untouched
        assert!(tenant.sender(Side::Upstream).is_none());
    }

    #[test]
    fn stale_disconnect_does_not_clear_new_occupant() {
        let tenant = Tenant::default();
        let (first, _rx1) = conn(1);
        let (second, _rx2) = conn(2);

        tenant.claim(Side::Upstream, first);
        tenant.claim(Side::Upstream, second);

        // The evicted connection's cleanup must be a no-op.
        assert!(!tenant.clear_if_current(Side::Upstream, 1));
        assert!(tenant.sender(Side::Upstream).is_some());

        // The current occupant's cleanup clears the slot.
        assert!(tenant.clear_if_current(Side::Upstream, 2));
        assert!(tenant.sender(Side::Upstream).is_none());
    }

    #[test]
    fn sides_clear_independently() {
        let tenant = Tenant::default();
        let (up, _rx1) = conn(1);
        let (down, _rx2) = conn(2);

        tenant.claim(Side::Upstream, up);
        tenant.claim(Side::Downstream, down);

        assert!(tenant.clear_if_current(Side::Upstream, 1));
        assert!(tenant.sender(Side::Downstream).is_some());
    }
}
