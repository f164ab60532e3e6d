use crate::pinning::errors::PinError;
use crate::pinning::pinset::PinSet;
use anyhow::Context;
use serde::Deserialize;
use std::{collections::HashSet, path::Path, path::PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
/// Pins, hostname policy, and trust anchors for one pinned endpoint.
///
/// Also the shape of a JSON pin file:
/// `{"pins": ["<base64>", ...], "expected_domain": "api.example.com"}`.
pub struct PinnerConfig {
    /// Base64 SHA-256 digests of the SPKIs you accept anywhere in the chain.
    #[serde(default)]
    pub pins: Vec<String>,
    /// Hostname the leaf must be valid for. `None` skips hostname checking.
    #[serde(default)]
    pub expected_domain: Option<String>,
    /// PEM bundles holding the trust anchors used for chain evaluation.
    #[serde(default)]
    pub root_pem_paths: Vec<PathBuf>,
    /// Optional SHA-256 fingerprints you accept for roots (uppercase hex with colons).
    #[serde(default)]
    pub allowed_root_fingerprints: HashSet<String>,
}

impl PinnerConfig {
    /// Reads a JSON pin file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg: Self = serde_json::from_str(&contents)
            .with_context(|| format!("parse pin file {:?}", path))?;
        Ok(cfg)
    }

    /// Parses the configured pins; an empty list is an error.
    pub fn pin_set(&self) -> Result<PinSet, PinError> {
        PinSet::new(&self.pins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_pin_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pins": ["TsshcWS7+i8HqvxNXGlWB7MciqndwD5+pLaEf3v1c7o=",
                         "klO23nT2ehFDXCfx3eHTDRESMz3asj1muO+4aIdjiuY="],
                "expected_domain": "api.example.com"}}"#
        )
        .unwrap();

        let cfg = PinnerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(cfg.expected_domain.as_deref(), Some("api.example.com"));
        assert!(cfg.root_pem_paths.is_empty());
        assert_eq!(cfg.pin_set().unwrap().len(), 2);
    }

    #[test]
    fn missing_pins_do_not_disable_pinning() {
        let cfg: PinnerConfig = serde_json::from_str("{}").unwrap();
        assert!(matches!(cfg.pin_set(), Err(PinError::EmptyPinSet)));
    }
}
