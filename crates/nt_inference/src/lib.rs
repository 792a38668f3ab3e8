use std::time::Duration;

pub mod extraction;
pub mod models;

pub use extraction::RemoteExtractor;
pub use models::create_model;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            base_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

pub mod prelude {
    pub use super::extraction::RemoteExtractor;
    pub use super::models::create_model;
    pub use super::Config;
    pub use nt_core::{Error, ExtractionMetadata, InferenceModel, Result};
}
