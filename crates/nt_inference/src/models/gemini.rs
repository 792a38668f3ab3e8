use async_trait::async_trait;
use nt_core::{Error, GenerationRequest, InferenceModel, ResponseShape, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use crate::Config;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Google Generative Language `generateContent` client.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiModel {
    pub fn new(config: Config) -> Result<Self> {
        let client = super::http_client(&config)?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Inference("Gemini API key is required".to_string()))?;
        let model = config
            .model_name
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
            .trim_start_matches("models/")
            .to_string();
        Ok(Self {
            client,
            api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &request.prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: match request.shape {
                    ResponseShape::Json => "application/json",
                    ResponseShape::Text => "text/plain",
                },
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Inference(format!("Gemini request failed: {}", e)))?
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Inference(format!("Gemini returned an unexpected body: {}", e)))?;

        let text = response
            .into_text()
            .ok_or_else(|| Error::Inference("Gemini returned no candidates".to_string()))?;
        debug!(bytes = text.len(), "Gemini completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> GeminiModel {
        GeminiModel::new(Config {
            api_key: Some("test-key".to_string()),
            model_name: Some("models/gemini-1.5-flash".to_string()),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_strips_models_prefix() {
        assert_eq!(
            model().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!format!("{:?}", model()).contains("test-key"));
    }

    #[test]
    fn test_response_text_is_joined() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"title\":"},{"text":"\"x\"}"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_text().unwrap(), r#"{"title":"x"}"#);

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.into_text().is_none());

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(blocked.into_text().is_none());
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts: vec![Part { text: "hi" }] }],
            generation_config: GenerationConfig { response_mime_type: "application/json" },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }
}
