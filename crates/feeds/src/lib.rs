//! Best-effort third-party feeds: the USD/BRL quote, market index levels
//! and the SELIC rate series. Every public call degrades to `None` or an
//! empty list on failure; callers show "n/d" instead.

pub mod market;
pub mod selic;
pub mod ticker;

use std::time::Duration;
use thiserror::Error;

pub use market::{parse_chart_quote, ChartQuote, IndexLevel, USD_BRL_SYMBOL};
pub use selic::{parse_selic_series, SelicPoint, SELIC_SERIES};
pub use ticker::Ticker;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_BCB_BASE_URL: &str = "https://api.bcb.gov.br";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Feed returned status {0}")]
    Status(u16),
    #[error("Unexpected payload: {0}")]
    Payload(String),
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub enabled: bool,
    pub timeout: Duration,
    pub yahoo_base_url: String,
    pub bcb_base_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_millis(2500),
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            bcb_base_url: DEFAULT_BCB_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("finapp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub(crate) async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }

    pub(crate) fn yahoo_base(&self) -> &str {
        self.config.yahoo_base_url.trim_end_matches('/')
    }

    pub(crate) fn bcb_base(&self) -> &str {
        self.config.bcb_base_url.trim_end_matches('/')
    }
}
