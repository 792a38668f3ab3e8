use async_trait::async_trait;
use nt_core::{Error, GenerationRequest, InferenceModel, Result};

/// Offline stand-in: every call fails, so extraction always takes the local
/// fallback path.
#[derive(Debug, Default)]
pub struct DummyModel;

#[async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(Error::Inference("no extraction service configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model_always_fails() {
        let model = DummyModel;
        let result = model.generate(&GenerationRequest::text("anything")).await;
        assert!(matches!(result, Err(Error::Inference(_))));
    }
}
