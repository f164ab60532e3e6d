use crate::pinning::digest::{KeyAlgorithm, KeySpec};
use crate::pinning::errors::PinError;
use crate::pinning::types::PublicKeyInfo;
use crate::pinning::util::sha256_fingerprint;
use anyhow::{anyhow, Context};
use rustls::crypto::{ring as ring_provider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, TrustAnchor, UnixTime};
use rustls::RootCertStore;
use rustls_pemfile as pemfile;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use webpki::{EndEntityCert, KeyUsage};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Captured data for a single trusted root certificate.
pub struct RootMetadata {
    pub fingerprint: String,
    pub subject_display: String,
    pub der: Vec<u8>,
}

/// Trust anchors for webpki path building, plus the DER each anchor came from.
pub struct RootStore {
    pub metadata: Vec<RootMetadata>,
    anchors: RootCertStore,
    algorithms: WebPkiSupportedAlgorithms,
}

impl RootStore {
    /// Loads PEM-encoded roots from disk and filters them against an allow-list.
    /// An empty allow-list keeps every root found.
    pub fn from_pem_files(
        paths: &[PathBuf],
        allow_fps: &HashSet<String>,
    ) -> anyhow::Result<RootStore> {
        let mut ders = Vec::new();
        for path in paths {
            let bytes = std::fs::read(path).with_context(|| format!("read {:?}", path))?;
            let mut cursor = Cursor::new(&bytes);
            let certs = pemfile::certs(&mut cursor)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow!("parse PEM in {:?}: {e:?}", path))?;
            ders.extend(certs.into_iter().map(|der| der.as_ref().to_vec()));
        }
        Self::from_ders(ders, allow_fps)
    }

    /// Builds the store from DER roots. Roots outside a non-empty allow-list
    /// never become anchors.
    pub fn from_ders<I>(ders: I, allow_fps: &HashSet<String>) -> anyhow::Result<RootStore>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut metadata = Vec::new();
        let mut anchors = RootCertStore::empty();

        for der in ders {
            let fp = sha256_fingerprint(&der);
            if !allow_fps.is_empty() && !allow_fps.contains(&fp) {
                continue;
            }
            let subject_display = match parse_x509_certificate(&der) {
                Ok((_, cert)) => cert.subject().to_string(),
                Err(e) => {
                    // Distribution bundles occasionally carry entries x509-parser refuses.
                    debug!(fingerprint = %fp, error = %e, "skipping unparsable root");
                    continue;
                }
            };
            if let Err(e) = anchors.add(CertificateDer::from(der.clone())) {
                debug!(fingerprint = %fp, error = %e, "skipping root webpki refuses as anchor");
                continue;
            }
            metadata.push(RootMetadata {
                fingerprint: fp,
                subject_display,
                der,
            });
        }

        anyhow::ensure!(!metadata.is_empty(), "no roots loaded");

        Ok(RootStore {
            metadata,
            anchors,
            algorithms: ring_provider::default_provider().signature_verification_algorithms,
        })
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Anchors are added one per root in load order, so positions line up.
    fn root_for(&self, anchor: &TrustAnchor<'_>) -> Option<&RootMetadata> {
        self.anchors
            .roots
            .iter()
            .position(|a| {
                a.subject.as_ref() == anchor.subject.as_ref()
                    && a.subject_public_key_info.as_ref() == anchor.subject_public_key_info.as_ref()
            })
            .and_then(|idx| self.metadata.get(idx))
    }
}

/// Standard server-certificate path validation at `now` (Unix seconds).
///
/// webpki builds the path from `leaf` through any of `intermediates` to a
/// store anchor, enforcing signatures, validity, basicConstraints and
/// pathLen, name constraints, critical extensions and the serverAuth EKU.
/// When `domain` is given the leaf must also be valid for it.
///
/// Returns the verified path leaf first, trust anchor last.
pub fn verify_chain(
    leaf: &CertificateDer<'_>,
    intermediates: &[CertificateDer<'_>],
    store: &RootStore,
    now: i64,
    domain: Option<&str>,
) -> Result<Vec<CertificateDer<'static>>, PinError> {
    let ee = EndEntityCert::try_from(leaf)
        .map_err(|e| PinError::TrustEvaluationFailed(format!("parse leaf cert: {e:?}")))?;
    let time = UnixTime::since_unix_epoch(Duration::from_secs(u64::try_from(now).unwrap_or(0)));

    let path = ee
        .verify_for_usage(
            store.algorithms.all,
            &store.anchors.roots,
            intermediates,
            time,
            KeyUsage::server_auth(),
            None,
            None,
        )
        .map_err(untrusted)?;

    if let Some(domain) = domain {
        let host = domain.trim_end_matches('.');
        let name = ServerName::try_from(host).map_err(|_| {
            PinError::TrustEvaluationFailed("expected domain is not a valid name".into())
        })?;
        ee.verify_is_valid_for_subject_name(&name).map_err(|_| {
            PinError::TrustEvaluationFailed(
                "leaf certificate not valid for expected domain".into(),
            )
        })?;
    }

    let root = store.root_for(path.anchor()).ok_or_else(|| {
        PinError::Internal("verified path ends at an anchor missing from the store".into())
    })?;
    debug!(root = %root.subject_display, "chain anchored");

    let mut ordered = Vec::with_capacity(2 + intermediates.len());
    ordered.push(leaf.clone().into_owned());
    ordered.extend(path.intermediate_certificates().map(|c| c.der().into_owned()));
    ordered.push(CertificateDer::from(root.der.clone()));
    Ok(ordered)
}

fn untrusted(err: webpki::Error) -> PinError {
    match err {
        webpki::Error::CertExpired { .. } | webpki::Error::CertNotValidYet { .. } => {
            PinError::TrustEvaluationFailed("certificate not valid at current time".into())
        }
        other => PinError::TrustEvaluationFailed(format!("{other:?}")),
    }
}

/// Splits a certificate's public key into the header-table key and the bare
/// key bytes a platform key export would return.
pub fn public_key_of(cert_der: &[u8]) -> Result<PublicKeyInfo, PinError> {
    let (_, cert) = parse_x509_certificate(cert_der)
        .map_err(|e| PinError::KeyExtractionFailed(format!("x509 parse: {e}")))?;
    let spki = cert.public_key();
    let algo = spki.algorithm.algorithm.to_string();

    let spec = match algo.as_str() {
        "1.2.840.113549.1.1.1" => {
            let parsed = spki
                .parsed()
                .map_err(|e| PinError::KeyExtractionFailed(format!("RSA key: {e}")))?;
            let PublicKey::RSA(rsa) = parsed else {
                return Err(PinError::KeyExtractionFailed(
                    "rsaEncryption key did not parse as RSA".into(),
                ));
            };
            let significant = rsa.modulus.iter().skip_while(|b| **b == 0).count();
            KeySpec::new(KeyAlgorithm::Rsa, (significant * 8) as u32)
        }
        "1.2.840.10045.2.1" => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.as_oid().ok())
                .map(|oid| oid.to_string())
                .ok_or_else(|| PinError::KeyExtractionFailed("EC key without named curve".into()))?;
            match curve.as_str() {
                "1.2.840.10045.3.1.7" => KeySpec::EC_P256,
                "1.3.132.0.34" => KeySpec::EC_P384,
                other => return Err(PinError::UnsupportedKey(format!("EC curve {other}"))),
            }
        }
        "1.3.101.112" => KeySpec::ED25519,
        other => return Err(PinError::UnsupportedKey(format!("key algorithm {other}"))),
    };

    Ok(PublicKeyInfo {
        spec,
        raw_key: spki.subject_public_key.data.to_vec(),
    })
}
