use crate::pinning::trust::TrustEvaluator;
use crate::pinning::types::CertificateChain;
use crate::pinning::validator::PinValidator;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{self, verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, Error as TlsError, SignatureScheme};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// rustls hook that runs the pin validator on every server handshake.
///
/// A reject aborts the handshake with a generic certificate error; the reason
/// is only logged.
pub struct PinningCertVerifier<E> {
    validator: Arc<PinValidator<E>>,
    expected_domain: Option<String>,
    provider: Arc<CryptoProvider>,
}

impl<E> fmt::Debug for PinningCertVerifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinningCertVerifier")
            .field("expected_domain", &self.expected_domain)
            .finish_non_exhaustive()
    }
}

impl<E: TrustEvaluator> PinningCertVerifier<E> {
    /// `expected_domain` is handed to trust evaluation as is; `None` disables
    /// hostname checking regardless of the SNI name rustls connects with.
    pub fn new(validator: Arc<PinValidator<E>>, expected_domain: Option<String>) -> Self {
        Self {
            validator,
            expected_domain,
            provider: Arc::new(crypto::ring::default_provider()),
        }
    }
}

impl<E: TrustEvaluator + 'static> PinningCertVerifier<E> {
    /// TLS client config that only completes handshakes this verifier accepts.
    pub fn into_client_config(self) -> Result<ClientConfig, TlsError> {
        let provider = self.provider.clone();
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(self))
            .with_no_client_auth();
        Ok(config)
    }
}

impl<E: TrustEvaluator + 'static> ServerCertVerifier for PinningCertVerifier<E> {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        let mut presented = Vec::with_capacity(1 + intermediates.len());
        presented.push(end_entity.clone());
        presented.extend(intermediates.iter().cloned());
        let chain = CertificateChain::new(&presented);

        match self.validator.check(&chain, self.expected_domain.as_deref()) {
            Ok(found) => {
                debug!(server = ?server_name, chain_index = found.chain_index, "pinned key presented");
                Ok(ServerCertVerified::assertion())
            }
            Err(err) => {
                warn!(server = ?server_name, reason = %err, "certificate pin validation failed");
                Err(TlsError::InvalidCertificate(
                    CertificateError::ApplicationVerificationFailure,
                ))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinning::certs::RootStore;
    use crate::pinning::pinset::PinSet;
    use crate::pinning::trust::RootStoreEvaluator;
    use std::collections::HashSet;

    const ROOT: &[u8] = include_bytes!("../../tests/fixtures/root_ca.der");
    const INTERMEDIATE: &[u8] = include_bytes!("../../tests/fixtures/intermediate_ca.der");
    const LEAF: &[u8] = include_bytes!("../../tests/fixtures/leaf.der");

    fn verifier(pin: &str, domain: Option<&str>) -> PinningCertVerifier<RootStoreEvaluator> {
        let roots = RootStore::from_ders(vec![ROOT.to_vec()], &HashSet::new()).unwrap();
        let validator = PinValidator::new(
            PinSet::new([pin]).unwrap(),
            RootStoreEvaluator::new(roots),
        );
        PinningCertVerifier::new(Arc::new(validator), domain.map(str::to_owned))
    }

    fn verify(v: &PinningCertVerifier<RootStoreEvaluator>) -> Result<ServerCertVerified, TlsError> {
        let server_name = ServerName::try_from("pinned.example.test").unwrap();
        v.verify_server_cert(
            &CertificateDer::from(LEAF),
            &[CertificateDer::from(INTERMEDIATE)],
            &server_name,
            &[],
            UnixTime::now(),
        )
    }

    #[test]
    fn pinned_intermediate_passes_handshake_check() {
        let v = verifier(
            "NMRzYosDaK7MwDsC3WV3DzLRrdffEBoPSFU2jR9dKVI=",
            Some("pinned.example.test"),
        );
        assert!(verify(&v).is_ok());
    }

    #[test]
    fn pin_mismatch_maps_to_generic_certificate_error() {
        let v = verifier("TsshcWS7+i8HqvxNXGlWB7MciqndwD5+pLaEf3v1c7o=", None);
        let err = verify(&v).unwrap_err();
        assert_eq!(
            err,
            TlsError::InvalidCertificate(CertificateError::ApplicationVerificationFailure)
        );
    }

    #[test]
    fn wrong_expected_domain_fails() {
        let v = verifier(
            "dJEieebcjGNh+hM+m8M3AZA3lTMalHcQJXj+JA4oC0Q=",
            Some("other.example.test"),
        );
        assert!(verify(&v).is_err());
    }

    #[test]
    fn builds_client_config() {
        let v = verifier("dJEieebcjGNh+hM+m8M3AZA3lTMalHcQJXj+JA4oC0Q=", None);
        let config = v.into_client_config().unwrap();
        assert!(config.alpn_protocols.is_empty());
    }
}
