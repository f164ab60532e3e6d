use crate::pinning::digest::spki_digest;
use crate::pinning::errors::PinError;
use crate::pinning::pinset::PinSet;
use crate::pinning::trust::TrustEvaluator;
use crate::pinning::types::{CertificateChain, PinMatch, ValidationOutcome};
use tracing::{debug, warn};

/// Pin validator with injected pins and trust evaluation.
///
/// Holds no mutable state; share it behind an `Arc` across handshakes.
pub struct PinValidator<E> {
    pins: PinSet,
    evaluator: E,
}

impl<E: TrustEvaluator> PinValidator<E> {
    pub fn new(pins: PinSet, evaluator: E) -> Self {
        Self { pins, evaluator }
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Accept/reject decision for one presented chain.
    pub fn validate(
        &self,
        chain: &CertificateChain<'_>,
        expected_domain: Option<&str>,
    ) -> ValidationOutcome {
        match self.check(chain, expected_domain) {
            Ok(found) => {
                debug!(chain_index = found.chain_index, "pin matched");
                ValidationOutcome::Accept
            }
            Err(err) => {
                warn!(reason = %err, "rejecting certificate chain");
                ValidationOutcome::Reject
            }
        }
    }

    /// Like [`validate`](Self::validate) but reports where the pin matched, or why nothing did.
    ///
    /// Standard trust evaluation runs first and a failure there is final.
    /// Certificates whose key cannot be extracted or digested are skipped.
    pub fn check(
        &self,
        chain: &CertificateChain<'_>,
        expected_domain: Option<&str>,
    ) -> Result<PinMatch, PinError> {
        if self.pins.is_empty() {
            return Err(PinError::EmptyPinSet);
        }

        let trusted = self.evaluator.evaluate(chain, expected_domain)?;

        for index in 0..trusted.len() {
            let digest = match trusted
                .public_key(index)
                .and_then(|key| spki_digest(key.spec, &key.raw_key))
            {
                Ok(digest) => digest,
                Err(err) => {
                    debug!(index, error = %err, "skipping certificate");
                    continue;
                }
            };
            debug!(index, %digest, "computed SPKI digest");
            if self.pins.contains(&digest) {
                return Ok(PinMatch {
                    chain_index: index,
                    digest,
                });
            }
        }

        Err(PinError::NoPinMatch)
    }
}
