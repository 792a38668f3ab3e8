use std::time::Duration;

/// Tunables shared by the ingestion crates.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Articles older than this many days stop a listing.
    pub recency_days: i64,
    /// Character cap on HTML sent to the extraction service.
    pub max_html_chars: usize,
    pub fetch_timeout: Duration,
    pub inference_timeout: Duration,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recency_days: 7,
            max_html_chars: 4000,
            fetch_timeout: Duration::from_secs(30),
            inference_timeout: Duration::from_secs(60),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl Settings {
    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.recency_days)
    }
}
