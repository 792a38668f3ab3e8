//! Prompts and response handling for the two extraction phases.
//!
//! Both phases send the same character-capped HTML. The metadata phase asks
//! for a fixed JSON object, the content phase for a Markdown body. Either can
//! fail independently; callers decide how to degrade.

use nt_core::types::{truncate_chars, SUBTITLE_MAX_CHARS};
use nt_core::{Error, ExtractionMetadata, GenerationRequest, InferenceModel, Result};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// Caps `html` at `max_chars` characters, appending [`TRUNCATION_MARKER`]
/// when something was cut.
pub fn cap_html(html: &str, max_chars: usize) -> Cow<'_, str> {
    match html.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(format!("{}{}", &html[..idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(html),
    }
}

pub fn metadata_prompt(site_name: &str, html: &str) -> String {
    format!(
        r#"Extract the article metadata from the HTML below.
Answer with a single JSON object with exactly these fields:
- "title": the article headline
- "subtitle": the first paragraph of the article, at most {max} characters
- "source": "{site}"
- "author": the author's name if present, otherwise "{site}"
- "published_at": publication time formatted "YYYY-MM-DD HH:MM:SS", or the current time if absent
- "created_at": the current time
- "read_count": 0
- "status": "publish"
- "image_url": URL of the main image, if any

{html}"#,
        max = SUBTITLE_MAX_CHARS,
        site = site_name,
        html = html,
    )
}

pub fn content_prompt(html: &str) -> String {
    format!(
        r#"Rewrite the body of the article below as valid Markdown: paragraphs, sentences and images.
Leave out the headline; output only the body.
- No image may appear in the first paragraph; images may start from the second or third paragraph.
- Leave out everything about the author: photo, name, author link and biography.
- If the article has an "About the Author" block (or a "saboxplugin-wrap" block), ignore all of it.
- Output the article body only, without any author section.

{html}"#,
        html = html,
    )
}

/// Removes a surrounding Markdown code fence, if the model added one.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses the metadata-phase answer. The source is pinned to `site_name`
/// and the subtitle is capped.
pub fn parse_metadata(raw: &str, site_name: &str) -> Result<ExtractionMetadata> {
    let body = strip_code_fence(raw);
    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(Error::Inference(format!(
                "metadata response is not a JSON object: {:?}",
                truncate_chars(body, 80)
            )))
        }
    };

    let mut meta: ExtractionMetadata = serde_json::from_str(json)
        .map_err(|e| Error::Inference(format!("malformed metadata JSON: {}", e)))?;
    meta.source = site_name.to_string();
    meta.subtitle = truncate_chars(&meta.subtitle, SUBTITLE_MAX_CHARS);
    Ok(meta)
}

/// Runs both extraction phases against a remote model.
#[derive(Clone)]
pub struct RemoteExtractor {
    model: Arc<dyn InferenceModel>,
    max_html_chars: usize,
}

impl RemoteExtractor {
    pub fn new(model: Arc<dyn InferenceModel>, max_html_chars: usize) -> Self {
        Self { model, max_html_chars }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    #[instrument(level = "debug", skip_all, fields(site = %site_name))]
    pub async fn extract_metadata(&self, html: &str, site_name: &str) -> Result<ExtractionMetadata> {
        let html = cap_html(html, self.max_html_chars);
        let request = GenerationRequest::json(metadata_prompt(site_name, &html));
        let raw = self.model.generate(&request).await?;
        let meta = parse_metadata(&raw, site_name)?;
        debug!(title = %meta.title, author = %meta.author, "Metadata extracted");
        Ok(meta)
    }

    /// Returns the Markdown body; an empty answer counts as a failure.
    #[instrument(level = "debug", skip_all)]
    pub async fn extract_content(&self, html: &str) -> Result<String> {
        let html = cap_html(html, self.max_html_chars);
        let request = GenerationRequest::text(content_prompt(&html));
        let raw = self.model.generate(&request).await?;
        let markdown = strip_code_fence(&raw);
        if markdown.is_empty() {
            return Err(Error::Inference("content response was empty".to_string()));
        }
        Ok(markdown.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nt_core::ResponseShape;
    use std::sync::Mutex;

    struct ScriptedModel {
        answer: String,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedModel {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InferenceModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_cap_html() {
        assert_eq!(cap_html("<p>short</p>", 4000), "<p>short</p>");
        let long = "é".repeat(4010);
        let capped = cap_html(&long, 4000);
        assert!(capped.ends_with(TRUNCATION_MARKER));
        assert_eq!(capped.chars().count(), 4000 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\nbody\n```"), "body");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn test_parse_metadata() {
        let raw = "Here you go:\n```json\n{\"title\":\"Misa Paskah\",\"subtitle\":\"".to_string()
            + &"x".repeat(300)
            + "\",\"source\":\"wrong\",\"author\":\"\",\"published_at\":\"2024-05-01 10:00:00\"}\n```";
        let meta = parse_metadata(&raw, "Katolikana").unwrap();
        assert_eq!(meta.title, "Misa Paskah");
        assert_eq!(meta.source, "Katolikana");
        assert_eq!(meta.subtitle.chars().count(), SUBTITLE_MAX_CHARS);
        assert_eq!(meta.author, "");
        assert!(meta.published_at.is_some());

        assert!(parse_metadata("I cannot help with that.", "Katolikana").is_err());
        assert!(parse_metadata("{\"title\": }", "Katolikana").is_err());
    }

    #[tokio::test]
    async fn test_both_phases_send_capped_html() {
        let model = ScriptedModel::new("```markdown\nFirst paragraph.\n```");
        let extractor = RemoteExtractor::new(model.clone(), 10);
        let html = "<p>0123456789abcdef</p>";

        let markdown = extractor.extract_content(html).await.unwrap();
        assert_eq!(markdown, "First paragraph.");
        assert!(extractor.extract_metadata(html, "Alpha").await.is_err());

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].shape, ResponseShape::Text);
        assert_eq!(seen[1].shape, ResponseShape::Json);
        for request in seen.iter() {
            assert!(request.prompt.contains("<p>0123456"));
            assert!(request.prompt.contains(TRUNCATION_MARKER));
            assert!(!request.prompt.contains("abcdef"));
        }
        assert!(seen[1].prompt.contains("\"Alpha\""));
    }

    #[tokio::test]
    async fn test_empty_content_answer_is_failure() {
        let extractor = RemoteExtractor::new(ScriptedModel::new("   "), 4000);
        assert!(matches!(
            extractor.extract_content("<p>x</p>").await,
            Err(Error::Inference(_))
        ));
    }
}
