//! VetoGate broker library.
//!
//! The broker is a rendezvous point: per tenant identity it pairs exactly
//! one upstream peer (a checkpoint's relay client) with one downstream peer
//! (a decision surface) and forwards opaque frames between them. It never
//! holds a key and never parses a frame, so a compromised broker learns
//! nothing and can forge nothing.

pub mod app_state;
pub mod config;
pub mod onboard;
pub mod registry;
pub mod router;
pub mod transport;
