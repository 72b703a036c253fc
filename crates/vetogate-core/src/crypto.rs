//! Authenticated-encryption codec and tenant-identity derivation.
//!
//! Everything the relay transports is sealed here with ChaCha20-Poly1305
//! under a 32-byte shared secret. A frame on the wire is always
//! `nonce (12 bytes) ‖ ciphertext+tag`, and the broker never holds the key,
//! so the relay hop can neither read nor forge payloads.
//!
//! Two base64 alphabets are in play and must never be interchanged:
//! - `STANDARD` for payload text carried inside JSON messages
//!   ([`encrypt_b64`] / [`decrypt_b64`]);
//! - `URL_SAFE` only for the key itself when it rides in a shareable link
//!   ([`Key::to_url_b64`] / [`Key::from_url_b64`]).

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Result, VetoGateError};

/// AEAD nonce length in bytes, prepended to every frame.
pub const NONCE_LEN: usize = 12;

/// Shared-secret length in bytes.
pub const KEY_LEN: usize = 32;

/// Number of digest bytes kept for the tenant identity (24 hex chars).
///
/// Truncation trades URL length against collision risk; 96 bits is far more
/// than demo-scale namespaces need, and the digest stays one-way regardless.
const TENANT_ID_BYTES: usize = 12;

/// Process-lifetime shared secret between a checkpoint and its decision
/// surface. Never transmitted to the broker.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Generate a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a key from its URL-safe base64 form (shareable-link encoding).
    pub fn from_url_b64(encoded: &str) -> Result<Self> {
        let raw = URL_SAFE
            .decode(encoded)
            .map_err(|e| VetoGateError::KeyFormat(format!("bad base64: {e}")))?;
        let bytes: [u8; KEY_LEN] = raw.try_into().map_err(|raw: Vec<u8>| {
            VetoGateError::KeyFormat(format!("expected {KEY_LEN} bytes, got {}", raw.len()))
        })?;
        Ok(Self(bytes))
    }

    /// URL-safe base64 form, for embedding in a shareable link fragment.
    pub fn to_url_b64(&self) -> String {
        URL_SAFE.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(..)")
    }
}

/// Derive the tenant identity for a key: truncated SHA-256, hex-encoded.
///
/// Deterministic on both sides of the relay: the checkpoint and the decision
/// surface each compute it independently from the shared key, and the broker
/// only ever sees this digest.
pub fn derive_tenant_id(key: &Key) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..TENANT_ID_BYTES])
}

/// Seal plaintext into a relay frame: fresh random nonce ‖ ciphertext+tag.
///
/// A new nonce is drawn from the OS RNG on every call; nonce reuse under the
/// same key would break confidentiality, so callers must never cache frames
/// for re-encryption.
pub fn encrypt(key: &Key, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| VetoGateError::EncryptFailed)?;
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| VetoGateError::EncryptFailed)?;

    let mut frame = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    frame.extend_from_slice(&nonce_bytes);
    frame.extend_from_slice(&ciphertext);
    Ok(frame)
}

/// Open a relay frame. Fails closed: a short frame or a bad tag is an error,
/// never partial or unauthenticated plaintext.
pub fn decrypt(key: &Key, frame: &[u8]) -> Result<Vec<u8>> {
    if frame.len() < NONCE_LEN {
        return Err(VetoGateError::FrameTooShort {
            got: frame.len(),
            need: NONCE_LEN,
        });
    }

    let (nonce_bytes, ciphertext) = frame.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| VetoGateError::DecryptFailed)?;
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VetoGateError::DecryptFailed)
}

/// Seal a string and return the frame as STANDARD base64, for payloads that
/// must ride inside JSON text rather than a binary message.
pub fn encrypt_b64(key: &Key, plaintext: &str) -> Result<String> {
    let frame = encrypt(key, plaintext.as_bytes())?;
    Ok(STANDARD.encode(frame))
}

/// Inverse of [`encrypt_b64`].
pub fn decrypt_b64(key: &Key, encoded: &str) -> Result<String> {
    let frame = STANDARD
        .decode(encoded)
        .map_err(|e| VetoGateError::BadEnvelope(format!("bad base64 frame: {e}")))?;
    let plaintext = decrypt(key, &frame)?;
    String::from_utf8(plaintext).map_err(|e| VetoGateError::BadEnvelope(format!("not utf-8: {e}")))
}
