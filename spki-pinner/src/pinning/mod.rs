pub mod certs;
pub mod config;
pub mod digest;
pub mod errors;
pub mod pinset;
pub mod tls;
pub mod trust;
pub mod types;
pub mod validator;

mod util;

pub use certs::RootStore;
pub use config::PinnerConfig;
pub use digest::{digest_spki_der, spki_digest, spki_pin, KeyAlgorithm, KeySpec, SpkiDigest};
pub use errors::PinError;
pub use pinset::PinSet;
pub use tls::PinningCertVerifier;
pub use trust::{RootStoreEvaluator, TrustEvaluator};
pub use types::{CertificateChain, PinMatch, PublicKeyInfo, TrustedChain, ValidationOutcome};
pub use validator::PinValidator;
