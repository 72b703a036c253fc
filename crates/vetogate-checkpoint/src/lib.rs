//! VetoGate checkpoint library.
//!
//! Hosts the two sides of the synchronous authorization contract: the
//! [`relay::RelayClient`] that keeps the encrypted upstream connection to
//! the broker, and the [`service::CheckpointService`] that turns one inbound
//! check into one deadline-bound decision request. A policy-enforcement
//! proxy calls [`service::CheckpointService::check`] and gets back a binary
//! verdict; everything else (encryption, reconnects, correlation, timeout
//! fallback to deny) stays behind that call.

pub mod backoff;
pub mod config;
pub mod http;
pub mod pending;
pub mod relay;
pub mod service;
