//! Pinned HTTPS fetching on top of `spki-pinner`.

pub mod client;
pub mod config;
pub mod logging;
pub mod result;
pub mod tls;

pub use client::PinnedClient;
pub use config::Config;
pub use result::{FetchError, FetchResult};
