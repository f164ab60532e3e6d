use anyhow::{Context, Result};
use rustls::ClientConfig;
use spki_pinner::pinning::{PinValidator, PinnerConfig, PinningCertVerifier, RootStoreEvaluator};
use std::sync::Arc;
use tracing::info;

/// Client TLS config that aborts every handshake the pin validator rejects.
pub fn pinned_client_config(cfg: &PinnerConfig) -> Result<ClientConfig> {
    let pins = cfg.pin_set().context("load pins")?;
    info!(pins = pins.len(), "Configuring pinned TLS client");

    let evaluator = RootStoreEvaluator::from_config(cfg).context("load trust anchors")?;
    let validator = Arc::new(PinValidator::new(pins, evaluator));

    let mut tls = PinningCertVerifier::new(validator, cfg.expected_domain.clone())
        .into_client_config()
        .context("failed to configure rustls client")?;
    tls.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(tls)
}
