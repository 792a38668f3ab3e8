use chrono::{DateTime, Duration, Utc};
use nt_core::{Error, Result};

/// Rejects articles published before `now - window`.
#[derive(Debug, Clone, Copy)]
pub struct RecencyGate {
    window: Duration,
}

impl RecencyGate {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, published_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        if published_at < now - self.window {
            return Err(Error::StaleArticle { published_at });
        }
        Ok(())
    }
}
