use async_trait::async_trait;
use nt_core::{Error, GenerationRequest, InferenceModel, ResponseShape, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Any OpenAI-compatible `/chat/completions` endpoint; DeepSeek by default.
pub struct DeepSeekModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepSeekModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Inference("DeepSeek API key is required".to_string()))?;
        Ok(Self {
            client: super::http_client(&config)?,
            api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

impl fmt::Debug for DeepSeekModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for DeepSeekModel {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            response_format: match request.shape {
                ResponseShape::Json => Some(ResponseFormat { kind: "json_object" }),
                ResponseShape::Text => None,
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Inference(format!("DeepSeek request failed: {}", e)))?
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::Inference(format!("DeepSeek returned an unexpected body: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Inference("DeepSeek returned no choices".to_string()))?;
        debug!(bytes = content.len(), "DeepSeek completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_requires_api_key() {
        let result = DeepSeekModel::new(Config::default());
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Inference error: DeepSeek API key is required"
        );

        let model = DeepSeekModel::new(Config {
            api_key: Some("test-key".to_string()),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..Config::default()
        })
        .unwrap();
        assert_eq!(model.base_url, "http://localhost:8080/v1");
        assert_eq!(model.model, DEFAULT_MODEL);
        assert!(!format!("{:?}", model).contains("test-key"));
    }

    #[test]
    fn test_json_requests_ask_for_json_object() {
        let body = ChatRequest {
            model: DEFAULT_MODEL,
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");

        let body = ChatRequest {
            model: DEFAULT_MODEL,
            messages: vec![],
            response_format: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_inference_error() {
        let model = DeepSeekModel::new(Config {
            api_key: Some("test-key".to_string()),
            base_url: Some("http://127.0.0.1:9/v1".to_string()),
            timeout: std::time::Duration::from_secs(2),
            ..Config::default()
        })
        .unwrap();
        let result = model.generate(&GenerationRequest::text("hello")).await;
        assert!(matches!(result, Err(Error::Inference(_))));
    }
}
