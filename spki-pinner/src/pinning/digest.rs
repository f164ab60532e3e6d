//! SPKI digests in the form published by `openssl dgst -sha256` style pinning
//! (RFC 7469 `pin-sha256`).
//!
//! Platform key exports usually hand back only the bare key (an RSA
//! `RSAPublicKey`, an EC point, a raw Ed25519 key). The digest is defined over
//! the full DER `SubjectPublicKeyInfo`, so the algorithm-identifier header has
//! to be re-attached first. Headers are fixed per (algorithm, key size); keys
//! outside the table are refused instead of producing a digest nobody can match.

use crate::pinning::errors::PinError;
use crate::pinning::util::{decode_b64, encode_b64, sha256};
use std::fmt;

/// Public-key algorithm family as far as SPKI headers are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    /// Named-curve EC key; the size selects the curve (256 = P-256, 384 = P-384).
    Ec,
    Ed25519,
}

/// Lookup key for the header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub algorithm: KeyAlgorithm,
    pub bits: u32,
}

impl KeySpec {
    pub const RSA_2048: KeySpec = KeySpec::new(KeyAlgorithm::Rsa, 2048);
    pub const RSA_3072: KeySpec = KeySpec::new(KeyAlgorithm::Rsa, 3072);
    pub const RSA_4096: KeySpec = KeySpec::new(KeyAlgorithm::Rsa, 4096);
    pub const EC_P256: KeySpec = KeySpec::new(KeyAlgorithm::Ec, 256);
    pub const EC_P384: KeySpec = KeySpec::new(KeyAlgorithm::Ec, 384);
    pub const ED25519: KeySpec = KeySpec::new(KeyAlgorithm::Ed25519, 256);

    pub const fn new(algorithm: KeyAlgorithm, bits: u32) -> Self {
        Self { algorithm, bits }
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.algorithm {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Ed25519 => "Ed25519",
        };
        write!(f, "{name}-{}", self.bits)
    }
}

struct SpkiHeader {
    spec: KeySpec,
    header: &'static [u8],
    /// Bare key length the header's DER lengths were computed for.
    key_len: usize,
}

const RSA_2048_HEADER: &[u8] = &[
    0x30, 0x82, 0x01, 0x22, 0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01,
    0x01, 0x05, 0x00, 0x03, 0x82, 0x01, 0x0f, 0x00,
];

const RSA_3072_HEADER: &[u8] = &[
    0x30, 0x82, 0x01, 0xa2, 0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01,
    0x01, 0x05, 0x00, 0x03, 0x82, 0x01, 0x8f, 0x00,
];

const RSA_4096_HEADER: &[u8] = &[
    0x30, 0x82, 0x02, 0x22, 0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01,
    0x01, 0x05, 0x00, 0x03, 0x82, 0x02, 0x0f, 0x00,
];

const EC_P256_HEADER: &[u8] = &[
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a,
    0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

const EC_P384_HEADER: &[u8] = &[
    0x30, 0x76, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05, 0x2b,
    0x81, 0x04, 0x00, 0x22, 0x03, 0x62, 0x00,
];

const ED25519_HEADER: &[u8] = &[
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

const SPKI_HEADERS: &[SpkiHeader] = &[
    SpkiHeader {
        spec: KeySpec::RSA_2048,
        header: RSA_2048_HEADER,
        key_len: 270,
    },
    SpkiHeader {
        spec: KeySpec::RSA_3072,
        header: RSA_3072_HEADER,
        key_len: 398,
    },
    SpkiHeader {
        spec: KeySpec::RSA_4096,
        header: RSA_4096_HEADER,
        key_len: 526,
    },
    SpkiHeader {
        spec: KeySpec::EC_P256,
        header: EC_P256_HEADER,
        key_len: 65,
    },
    SpkiHeader {
        spec: KeySpec::EC_P384,
        header: EC_P384_HEADER,
        key_len: 97,
    },
    SpkiHeader {
        spec: KeySpec::ED25519,
        header: ED25519_HEADER,
        key_len: 32,
    },
];

/// SHA-256 of a DER `SubjectPublicKeyInfo`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpkiDigest([u8; 32]);

impl SpkiDigest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a base64 pin. An `sha256/` prefix (as written by several HTTP
    /// clients' pinning configs) is accepted and ignored.
    pub fn from_base64(pin: &str) -> Result<Self, PinError> {
        let trimmed = pin.trim();
        let value = trimmed.strip_prefix("sha256/").unwrap_or(trimmed);
        let bytes = decode_b64("pin", value).map_err(|e| PinError::InvalidPin(e.to_string()))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|raw: Vec<u8>| {
            PinError::InvalidPin(format!("expected 32 digest bytes, got {}", raw.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        encode_b64(&self.0)
    }
}

impl fmt::Display for SpkiDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for SpkiDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpkiDigest({})", self.to_base64())
    }
}

/// Rebuilds the DER `SubjectPublicKeyInfo` for a bare key export.
pub fn reconstruct_spki(spec: KeySpec, raw_key: &[u8]) -> Result<Vec<u8>, PinError> {
    let entry = SPKI_HEADERS
        .iter()
        .find(|entry| entry.spec == spec)
        .ok_or_else(|| PinError::UnsupportedKey(format!("no SPKI header for {spec}")))?;

    if raw_key.len() != entry.key_len {
        return Err(PinError::UnsupportedKey(format!(
            "{spec} key is {} bytes, header expects {}",
            raw_key.len(),
            entry.key_len
        )));
    }

    let mut spki = Vec::with_capacity(entry.header.len() + raw_key.len());
    spki.extend_from_slice(entry.header);
    spki.extend_from_slice(raw_key);
    Ok(spki)
}

/// Digest of a bare key after header reconstruction.
pub fn spki_digest(spec: KeySpec, raw_key: &[u8]) -> Result<SpkiDigest, PinError> {
    let spki = reconstruct_spki(spec, raw_key)?;
    Ok(digest_spki_der(&spki))
}

/// Base64 pin string for a bare key.
pub fn spki_pin(spec: KeySpec, raw_key: &[u8]) -> Result<String, PinError> {
    spki_digest(spec, raw_key).map(|d| d.to_base64())
}

/// Digest of an already complete DER `SubjectPublicKeyInfo`.
pub fn digest_spki_der(spki_der: &[u8]) -> SpkiDigest {
    SpkiDigest(sha256(spki_der))
}
