use serde::Deserialize;
use spki_pinner::pinning::PinnerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
/// Runtime configuration loaded from `FETCH_*` environment variables.
pub struct Config {
    pub url: String,

    /// Comma-separated base64 SHA-256 SPKI pins.
    #[serde(default)]
    pub pins: Vec<String>,

    /// JSON pin file; its pins are added to `pins`.
    #[serde(default)]
    pub pins_path: Option<PathBuf>,

    #[serde(default)]
    pub expected_domain: Option<String>,

    #[serde(default = "def_root_pem_paths")]
    pub root_pem_paths: Vec<PathBuf>,

    #[serde(default)]
    pub allowed_root_fingerprints: Vec<String>,

    #[serde(default = "def_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect here instead of resolving the URL's host; SNI and hostname
    /// checks still use the host from the URL.
    #[serde(default)]
    pub connect_addr: Option<SocketAddr>,

    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            pins: Vec::new(),
            pins_path: None,
            expected_domain: None,
            root_pem_paths: def_root_pem_paths(),
            allowed_root_fingerprints: Vec::new(),
            timeout_secs: def_timeout_secs(),
            connect_addr: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Populates the configuration from environment variables, honoring `.env`.
    pub fn from_env() -> anyhow::Result<Self> {
        tracing::debug!("fetching config");
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let cfg: Self = envy::prefixed("FETCH_").from_iter(vars)?;
        Ok(cfg)
    }

    /// Pinning configuration, merging inline pins with the optional pin file.
    /// An explicit `expected_domain` wins over the pin file's.
    pub fn pinner_config(&self) -> anyhow::Result<PinnerConfig> {
        let mut pinner = match &self.pins_path {
            Some(path) => PinnerConfig::from_json_file(path)?,
            None => PinnerConfig::default(),
        };
        pinner.pins.extend(self.pins.iter().cloned());
        if self.expected_domain.is_some() {
            pinner.expected_domain = self.expected_domain.clone();
        }
        if pinner.root_pem_paths.is_empty() {
            pinner.root_pem_paths = self.root_pem_paths.clone();
        }
        pinner
            .allowed_root_fingerprints
            .extend(self.allowed_root_fingerprints.iter().cloned());
        Ok(pinner)
    }

    /// Emit the effective configuration via tracing. Pin values stay out of the log.
    pub fn info(&self) {
        tracing::info!(
            url = %self.url,
            pins = self.pins.len(),
            pins_path = ?self.pins_path,
            expected_domain = ?self.expected_domain,
            roots = ?self.root_pem_paths,
            timeout_secs = self.timeout_secs,
            "effective config"
        );
        if self.expected_domain.is_none() {
            tracing::warn!("no expected domain set; hostname checking is disabled");
        }
        if let Some(addr) = self.connect_addr {
            tracing::info!(%addr, "connect address overridden");
        }
    }
}

fn def_root_pem_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("/etc/ssl/certs/ca-certificates.crt")]
}

fn def_timeout_secs() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_prefixed_vars_with_defaults() {
        let cfg = Config::from_vars(vars(&[
            ("FETCH_URL", "https://api.example.com/"),
            (
                "FETCH_PINS",
                "TsshcWS7+i8HqvxNXGlWB7MciqndwD5+pLaEf3v1c7o=,klO23nT2ehFDXCfx3eHTDRESMz3asj1muO+4aIdjiuY=",
            ),
            ("FETCH_CONNECT_ADDR", "127.0.0.1:8443"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(cfg.url, "https://api.example.com/");
        assert_eq!(cfg.pins.len(), 2);
        assert_eq!(cfg.timeout_secs, 15);
        assert_eq!(cfg.root_pem_paths, def_root_pem_paths());
        assert_eq!(cfg.connect_addr, Some("127.0.0.1:8443".parse().unwrap()));
        assert!(cfg.expected_domain.is_none());
    }

    #[test]
    fn url_is_required() {
        assert!(Config::from_vars(vars(&[("FETCH_PINS", "x")])).is_err());
    }

    #[test]
    fn merges_pin_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pins": ["klO23nT2ehFDXCfx3eHTDRESMz3asj1muO+4aIdjiuY="], "expected_domain": "from-file.example.com"}}"#
        )
        .unwrap();

        let cfg = Config {
            url: "https://api.example.com/".into(),
            pins: vec!["TsshcWS7+i8HqvxNXGlWB7MciqndwD5+pLaEf3v1c7o=".into()],
            pins_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let pinner = cfg.pinner_config().unwrap();
        assert_eq!(pinner.pin_set().unwrap().len(), 2);
        assert_eq!(pinner.expected_domain.as_deref(), Some("from-file.example.com"));
        assert_eq!(pinner.root_pem_paths, def_root_pem_paths());

        let overridden = Config {
            expected_domain: Some("api.example.com".into()),
            ..cfg
        };
        assert_eq!(
            overridden.pinner_config().unwrap().expected_domain.as_deref(),
            Some("api.example.com")
        );
    }

    #[test]
    fn no_pins_anywhere_is_an_error_downstream() {
        let cfg = Config {
            url: "https://api.example.com/".into(),
            ..Default::default()
        };
        assert!(cfg.pinner_config().unwrap().pin_set().is_err());
    }
}
