//! Decision request/response envelopes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VetoGateError};

/// One authorization question, keyed by its correlation id.
///
/// Immutable once built; the checkpoint destroys it when the matching
/// response arrives or its deadline expires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DecisionRequest {
    /// Correlation id linking this request to its eventual response.
    pub id: String,
    /// HTTP method of the inbound check.
    pub method: String,
    /// Request path of the inbound check.
    pub path: String,
    /// Header attributes, sorted for a stable wire form.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// The surface's answer. Consumed exactly once to resolve a pending wait.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DecisionResponse {
    /// Correlation id of the request being answered.
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// The verdict: true = allow, false = deny.
    pub approved: bool,
}

/// Serialize a request to its canonical JSON plaintext.
pub fn encode_request(req: &DecisionRequest) -> Result<Vec<u8>> {
    serde_json::to_vec(req).map_err(|e| VetoGateError::Internal(format!("encode request: {e}")))
}

/// Parse a decrypted response payload.
pub fn decode_response(plaintext: &[u8]) -> Result<DecisionResponse> {
    serde_json::from_slice(plaintext)
        .map_err(|e| VetoGateError::BadEnvelope(format!("invalid response json: {e}")))
}
