//! Shared application state for the broker.

use std::sync::Arc;

use crate::config::BrokerConfig;
use crate::registry::TenantRegistry;

#[derive(Clone)]
pub struct BrokerState {
    inner: Arc<BrokerStateInner>,
}

struct BrokerStateInner {
    cfg: BrokerConfig,
    registry: TenantRegistry,
}

impl BrokerState {
    pub fn new(cfg: BrokerConfig) -> Self {
        Self {
            inner: Arc::new(BrokerStateInner {
                cfg,
                registry: TenantRegistry::new(),
            }),
        }
    }

    pub fn cfg(&self) -> &BrokerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &TenantRegistry {
        &self.inner.registry
    }
}
