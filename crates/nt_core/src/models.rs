use async_trait::async_trait;
use crate::Result;

/// The output shape requested from the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Json,
    Text,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub shape: ResponseShape,
}

impl GenerationRequest {
    pub fn json(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), shape: ResponseShape::Json }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), shape: ResponseShape::Text }
    }
}

#[async_trait]
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    /// Single completion call against the remote service.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
