use nt_core::{Error, InferenceModel, Result};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;
use crate::Config;

pub mod deepseek;
pub mod dummy;
pub mod gemini;

pub use deepseek::DeepSeekModel;
pub use dummy::DummyModel;
pub use gemini::GeminiModel;

pub(crate) fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::Inference(format!("Failed to build HTTP client: {}", e)))
}

/// Builds the extraction service client named by `kind`.
pub fn create_model(kind: &str, config: Config) -> Result<Arc<dyn InferenceModel>> {
    let model: Arc<dyn InferenceModel> = match kind {
        "gemini" => Arc::new(GeminiModel::new(config)?),
        "deepseek" | "openai" => Arc::new(DeepSeekModel::new(config)?),
        "dummy" | "none" => Arc::new(DummyModel),
        other => {
            return Err(Error::Config(format!(
                "Unknown model: {other} (expected gemini, deepseek or dummy)"
            )))
        }
    };
    info!(model = model.name(), "Extraction model ready");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model_by_name() {
        let config = Config {
            api_key: Some("test-key".to_string()),
            ..Config::default()
        };
        assert_eq!(create_model("gemini", config.clone()).unwrap().name(), "Gemini");
        assert_eq!(create_model("deepseek", config.clone()).unwrap().name(), "DeepSeek");
        assert_eq!(create_model("dummy", Config::default()).unwrap().name(), "Dummy");
        assert!(matches!(create_model("llama", config), Err(Error::Config(_))));
    }

    #[test]
    fn test_remote_models_require_api_key() {
        assert!(create_model("gemini", Config::default()).is_err());
        assert!(create_model("deepseek", Config::default()).is_err());
    }
}
