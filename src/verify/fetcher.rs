use crate::error::{JanitorError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches a URL and returns its body as text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// Plain GET over reqwest with a fixed `User-Agent`. No retries.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| JanitorError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching");

        let network_error = |e: reqwest::Error| JanitorError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(network_error)?
            .error_for_status()
            .map_err(network_error)?;

        response.text().await.map_err(network_error)
    }
}
