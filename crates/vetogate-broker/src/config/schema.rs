use serde::Deserialize;
use vetogate_core::{Result, VetoGateError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    pub version: u32,

    #[serde(default)]
    pub broker: BrokerSection,
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VetoGateError::Config("unsupported config version".into()));
        }
        self.broker.validate()?;
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            broker: BrokerSection::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    /// Bound on each connection's outbound queue. Frames beyond this back
    /// up the sender rather than growing memory.
    #[serde(default = "default_forward_queue")]
    pub forward_queue: usize,
}

impl Default for BrokerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            forward_queue: default_forward_queue(),
        }
    }
}

impl BrokerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=120000).contains(&self.ping_interval_ms) {
            return Err(VetoGateError::Config(
                "broker.ping_interval_ms must be between 1000 and 120000".into(),
            ));
        }
        if self.forward_queue == 0 {
            return Err(VetoGateError::Config(
                "broker.forward_queue must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:9090".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_forward_queue() -> usize {
    64
}
