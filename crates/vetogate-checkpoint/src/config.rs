//! Checkpoint config loader (strict parsing).

use std::fs;

use serde::Deserialize;
use tokio::time::Duration;

use vetogate_core::{Result, VetoGateError};

use crate::backoff::RetryPolicy;

pub fn load_from_file(path: &str) -> Result<CheckpointConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| VetoGateError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<CheckpointConfig> {
    let cfg: CheckpointConfig =
        serde_yaml::from_str(s).map_err(|e| VetoGateError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointConfig {
    pub version: u32,

    #[serde(default)]
    pub checkpoint: CheckpointSection,
}

impl CheckpointConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VetoGateError::Config("unsupported config version".into()));
        }
        self.checkpoint.validate()?;
        Ok(())
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            version: 1,
            checkpoint: CheckpointSection::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointSection {
    /// Broker base URL (ws:// or wss://).
    #[serde(default = "default_broker_url")]
    pub broker_url: String,

    /// Where the check endpoint listens.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Decision deadline per check.
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,

    #[serde(default)]
    pub retry: RetrySection,

    /// Shared secret, URL-safe base64 (32 bytes decoded). Absent: a fresh
    /// key is generated at startup and the share link logged.
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for CheckpointSection {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            listen: default_listen(),
            check_timeout_ms: default_check_timeout_ms(),
            retry: RetrySection::default(),
            key: None,
        }
    }
}

impl CheckpointSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.broker_url.starts_with("ws://") || self.broker_url.starts_with("wss://")) {
            return Err(VetoGateError::Config(
                "checkpoint.broker_url must start with ws:// or wss://".into(),
            ));
        }
        if !(100..=600_000).contains(&self.check_timeout_ms) {
            return Err(VetoGateError::Config(
                "checkpoint.check_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        self.retry.validate()?;
        Ok(())
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetrySection {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(VetoGateError::Config(
                "checkpoint.retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.delay_ms > 60_000 {
            return Err(VetoGateError::Config(
                "checkpoint.retry.delay_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

fn default_broker_url() -> String {
    "ws://127.0.0.1:9090".into()
}
fn default_listen() -> String {
    "127.0.0.1:8081".into()
}
fn default_check_timeout_ms() -> u64 {
    30_000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1_000
}
