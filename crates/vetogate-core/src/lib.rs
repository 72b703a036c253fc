//! VetoGate core: decision envelopes, error types, and the crypto codec.
//!
//! This crate defines the wire-level contracts shared by the broker, the
//! checkpoint service, and any external decision surface. It intentionally
//! carries no transport or runtime dependencies so the same codec can be
//! reused on either end of the relay.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `VetoGateError`/`Result` so malformed
//! or hostile frames can never crash a relay process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod crypto;
pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, VetoGateError};
