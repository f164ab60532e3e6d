use crate::pinning::errors::PinError;
use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use ring::digest::{digest, SHA256, SHA256_OUTPUT_LEN};
use std::time::{SystemTime, UNIX_EPOCH};

/// Raw SHA-256 over `data`.
pub fn sha256(data: &[u8]) -> [u8; SHA256_OUTPUT_LEN] {
    let d = digest(&SHA256, data);
    let mut out = [0u8; SHA256_OUTPUT_LEN];
    out.copy_from_slice(d.as_ref());
    out
}

/// Formats a SHA-256 digest as uppercase colon-separated hex.
pub fn sha256_fingerprint(data: &[u8]) -> String {
    let d = sha256(data);
    let mut out = String::with_capacity(d.len() * 3);
    for (idx, byte) in d.iter().enumerate() {
        if idx > 0 {
            out.push(':');
        }
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

/// Returns the current Unix timestamp in seconds.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

pub fn encode_b64(bytes: &[u8]) -> String {
    b64.encode(bytes)
}

/// Base64-decodes `value`, tagging errors with the provided label.
pub fn decode_b64(label: &str, value: &str) -> Result<Vec<u8>, PinError> {
    b64.decode(value.trim().as_bytes())
        .map_err(|e| PinError::Decode(format!("{label}: {e}")))
}
