use anyhow::{anyhow, Context, Result};
use reqwest::header::CONTENT_LENGTH;
use reqwest::Url;
use spki_pinner::pinning::PinnerConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::result::{FetchError, FetchResult};

/// HTTPS client whose every connection goes through the SPKI pin validator.
pub struct PinnedClient {
    http: reqwest::Client,
}

impl PinnedClient {
    pub fn builder(cfg: Config) -> PinnedClientBuilder {
        PinnedClientBuilder::from(cfg)
    }

    /// Performs one GET. Failures come back inside the result rather than as `Err`.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        debug!(%url, "fetching");
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => return failed(&e),
        };

        let status = response.status();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => return failed(&e),
        };

        let result = FetchResult::from_response(status, content_length, body);
        info!(
            status = result.status_code,
            bytes = result.body.len(),
            "fetch finished"
        );
        result
    }
}

fn failed(err: &reqwest::Error) -> FetchResult {
    let classified = FetchError::classify(err);
    // Full detail stays in the debug log; the result message is generic.
    debug!(error = ?err, "request failed");
    warn!(error = %classified, "fetch failed");
    FetchResult::from_error(classified)
}

pub struct PinnedClientBuilder {
    cfg: Config,
    pinner: Option<PinnerConfig>,
}

impl PinnedClientBuilder {
    pub fn from(cfg: Config) -> Self {
        Self { cfg, pinner: None }
    }

    /// Resolves the pin configuration from inline pins and the optional pin file.
    pub fn load_pins(mut self) -> Result<Self> {
        let pinner = self.cfg.pinner_config().context("load pin configuration")?;
        if pinner.pins.is_empty() {
            return Err(anyhow!("no pins configured; set FETCH_PINS or FETCH_PINS_PATH"));
        }
        self.pinner = Some(pinner);
        Ok(self)
    }

    pub fn build(self) -> Result<PinnedClient> {
        let pinner = self
            .pinner
            .ok_or_else(|| anyhow!("pin configuration not loaded"))?;
        let tls = crate::tls::pinned_client_config(&pinner)?;

        let mut builder = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .timeout(Duration::from_secs(self.cfg.timeout_secs))
            .https_only(true);

        if let Some(addr) = self.cfg.connect_addr {
            let url = Url::parse(&self.cfg.url).context("parse FETCH_URL")?;
            let host = url
                .host_str()
                .ok_or_else(|| anyhow!("FETCH_URL has no host"))?;
            info!(%host, %addr, "pinning DNS resolution");
            builder = builder.resolve(host, addr);
        }

        let http = builder.build().context("build HTTP client")?;
        Ok(PinnedClient { http })
    }
}
