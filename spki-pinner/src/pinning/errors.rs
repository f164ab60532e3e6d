use thiserror::Error;

#[derive(Debug, Error)]
/// Reasons a pin check can fail. Messages never carry digest values or pins.
pub enum PinError {
    #[error("trust evaluation failed: {0}")]
    TrustEvaluationFailed(String),
    #[error("public key extraction failed: {0}")]
    KeyExtractionFailed(String),
    #[error("unsupported public key: {0}")]
    UnsupportedKey(String),
    #[error("no certificate in the chain matches a configured pin")]
    NoPinMatch,
    #[error("pin set is empty")]
    EmptyPinSet,
    #[error("invalid pin: {0}")]
    InvalidPin(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PinError {
    /// Errors confined to a single certificate; the chain scan moves on past them.
    pub fn is_per_certificate(&self) -> bool {
        matches!(
            self,
            PinError::KeyExtractionFailed(_) | PinError::UnsupportedKey(_)
        )
    }
}
