use async_trait::async_trait;
use nt_core::{Error, Result, Settings};
use reqwest::Client;
use tracing::debug;

/// Source of raw page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest` fetcher with the configured timeout and user agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.fetch_timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn fetch_error(url: &str, e: reqwest::Error) -> Error {
    let reason = if e.is_timeout() {
        "timed out".to_string()
    } else {
        e.to_string()
    };
    Error::Fetch {
        url: url.to_string(),
        reason,
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(url, e))?;
        let body = response.text().await.map_err(|e| fetch_error(url, e))?;
        debug!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let settings = Settings {
            fetch_timeout: Duration::from_secs(2),
            ..Settings::default()
        };
        let fetcher = HttpFetcher::new(&settings).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/listing").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
