//! Shared error type across VetoGate crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, VetoGateError>;

/// Unified error type used by the core codec, broker, and checkpoint.
///
/// The variants map one-to-one onto the failure taxonomy of the system:
/// key/config problems are fatal at startup, crypto and envelope problems
/// are handled fail-closed at the frame boundary, and connect/send problems
/// are retried before they surface.
#[derive(Debug, Error)]
pub enum VetoGateError {
    /// Secret key is the wrong length or not valid URL-safe base64.
    /// Fatal at startup: no key, no tenant identity.
    #[error("invalid key: {0}")]
    KeyFormat(String),
    /// AEAD seal failed (should not happen with a well-formed key).
    #[error("encryption failed")]
    EncryptFailed,
    /// Frame shorter than the nonce prefix.
    #[error("frame too short: {got} bytes, need at least {need}")]
    FrameTooShort { got: usize, need: usize },
    /// Authentication tag did not verify. The frame is forged or corrupted.
    #[error("decryption failed")]
    DecryptFailed,
    /// Plaintext did not parse as the expected JSON envelope.
    #[error("bad envelope: {0}")]
    BadEnvelope(String),
    /// Could not reach the broker.
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    /// No live connection and the caller asked for one.
    #[error("not connected to relay")]
    NotConnected,
    /// Write retries exhausted; the request never left this process.
    #[error("send failed after {attempts} attempts")]
    SendExhausted { attempts: u32 },
    /// Bad configuration file.
    #[error("config: {0}")]
    Config(String),
    /// Internal invariant violation.
    #[error("internal: {0}")]
    Internal(String),
}
