//! Plaintext decision envelopes (pre-encryption wire shapes).
//!
//! These are the only two message shapes that cross the relay: a request
//! from the checkpoint to the decision surface and a response back. Both
//! travel as JSON, sealed by [`crate::crypto`] before they touch the wire,
//! so the broker only ever forwards opaque frames.
//!
//! All parsers are panic-free: malformed input is reported as
//! `VetoGateError` instead of panicking, keeping read loops resilient to
//! hostile or garbled traffic.

pub mod decision;

pub use decision::{decode_response, encode_request, DecisionRequest, DecisionResponse};
