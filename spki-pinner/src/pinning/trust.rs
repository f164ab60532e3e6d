use crate::pinning::certs::{verify_chain, RootStore};
use crate::pinning::config::PinnerConfig;
use crate::pinning::errors::PinError;
use crate::pinning::types::{CertificateChain, TrustedChain};
use crate::pinning::util::now_secs;
use std::sync::Arc;

/// Standard chain-of-trust evaluation, independent of pinning.
///
/// Implementations check signatures, validity periods and, when `domain` is
/// given, that the leaf is valid for it. With `domain == None` hostname
/// checking is skipped entirely.
pub trait TrustEvaluator: Send + Sync {
    fn evaluate(
        &self,
        chain: &CertificateChain<'_>,
        domain: Option<&str>,
    ) -> Result<TrustedChain, PinError>;
}

impl<T: TrustEvaluator + ?Sized> TrustEvaluator for Arc<T> {
    fn evaluate(
        &self,
        chain: &CertificateChain<'_>,
        domain: Option<&str>,
    ) -> Result<TrustedChain, PinError> {
        (**self).evaluate(chain, domain)
    }
}

/// Evaluates chains with webpki against a fixed set of PEM/DER trust anchors.
pub struct RootStoreEvaluator {
    roots: RootStore,
}

impl RootStoreEvaluator {
    pub fn new(roots: RootStore) -> Self {
        Self { roots }
    }

    /// Loads the anchors named by `cfg.root_pem_paths`, filtered by
    /// `cfg.allowed_root_fingerprints`.
    pub fn from_config(cfg: &PinnerConfig) -> anyhow::Result<Self> {
        let roots = RootStore::from_pem_files(&cfg.root_pem_paths, &cfg.allowed_root_fingerprints)?;
        tracing::info!(roots = roots.len(), "trust anchors loaded");
        Ok(Self::new(roots))
    }

    pub fn roots(&self) -> &RootStore {
        &self.roots
    }
}

impl TrustEvaluator for RootStoreEvaluator {
    fn evaluate(
        &self,
        chain: &CertificateChain<'_>,
        domain: Option<&str>,
    ) -> Result<TrustedChain, PinError> {
        let leaf = chain
            .leaf()
            .ok_or_else(|| PinError::TrustEvaluationFailed("empty certificate chain".into()))?;
        let path = verify_chain(leaf, chain.intermediates(), &self.roots, now_secs(), domain)?;
        Ok(TrustedChain::new(path))
    }
}
