use crate::pinning::certs::public_key_of;
use crate::pinning::digest::{KeySpec, SpkiDigest};
use crate::pinning::errors::PinError;
use rustls::pki_types::CertificateDer;

/// Result of one pin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accept,
    Reject,
}

impl ValidationOutcome {
    pub fn is_accept(self) -> bool {
        matches!(self, ValidationOutcome::Accept)
    }
}

/// Certificates as presented by the peer, leaf first. Borrowed for one call.
#[derive(Debug, Clone, Copy)]
pub struct CertificateChain<'a> {
    certs: &'a [CertificateDer<'a>],
}

impl<'a> CertificateChain<'a> {
    pub fn new(certs: &'a [CertificateDer<'a>]) -> Self {
        Self { certs }
    }

    pub fn leaf(&self) -> Option<&'a CertificateDer<'a>> {
        self.certs.first()
    }

    /// Everything after the leaf.
    pub fn intermediates(&self) -> &'a [CertificateDer<'a>] {
        self.certs.get(1..).unwrap_or_default()
    }

    pub fn certificates(&self) -> &'a [CertificateDer<'a>] {
        self.certs
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

/// Bare public key of one certificate plus the header-table key it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyInfo {
    pub spec: KeySpec,
    pub raw_key: Vec<u8>,
}

/// Chain vetted by a trust evaluator, ordered leaf to trust anchor.
#[derive(Debug, Clone, Default)]
pub struct TrustedChain {
    certs: Vec<CertificateDer<'static>>,
}

impl TrustedChain {
    pub fn new(certs: Vec<CertificateDer<'static>>) -> Self {
        Self { certs }
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certs
    }

    /// Extracts the public key of the certificate at `index`.
    pub fn public_key(&self, index: usize) -> Result<PublicKeyInfo, PinError> {
        let cert = self
            .certs
            .get(index)
            .ok_or_else(|| PinError::Internal(format!("chain has no certificate {index}")))?;
        public_key_of(cert.as_ref())
    }
}

/// Developer-facing detail of an accepted chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinMatch {
    /// Position of the matching certificate in the trusted chain.
    pub chain_index: usize,
    pub digest: SpkiDigest,
}
