use anyhow::{anyhow, Result};
use pinned_fetch::{logging, Config, PinnedClient};

/// Parses configuration, initialises logging, and performs one pinned fetch.
#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env()?;
    logging::setup_logging(&cfg)?;
    cfg.info();

    let url = cfg.url.clone();
    let client = PinnedClient::builder(cfg).load_pins()?.build()?;
    let result = client.fetch(&url).await;

    println!(
        "{url}: status={} bytes={} timed_out={}",
        result.status_code,
        result.body.len(),
        result.timed_out
    );

    if !result.success() {
        return Err(anyhow!("fetch failed: {}", result.message));
    }

    match result.body_utf8() {
        Some(text) => println!("{text}"),
        None => println!("<{} bytes of binary data>", result.body.len()),
    }
    Ok(())
}
