use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Maximum length, in characters, of an article subtitle.
pub const SUBTITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Publish,
    Draft,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Publish => "publish",
            ArticleStatus::Draft => "draft",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("draft") {
            ArticleStatus::Draft
        } else {
            ArticleStatus::Publish
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link found on a listing page, resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub url: String,
    pub site: String,
}

/// The unit of extraction and storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub subtitle: String,
    /// Templated HTML document.
    pub content: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub image_url: String,
    pub status: ArticleStatus,
    pub author: String,
}

impl Article {
    /// Articles without a title or a body are never persisted.
    pub fn is_publishable(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }
}

/// An article as it sits in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: i64,
    #[serde(flatten)]
    pub article: Article,
    /// Insertion time assigned by the store.
    pub created_at: DateTime<Utc>,
    pub read_count: i64,
}

/// Result of the metadata phase, merged into an [`Article`] and then dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_deserializing, default)]
    pub read_count: u32,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ArticleStatus,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image_url: String,
}

impl ExtractionMetadata {
    pub fn empty(source: &str) -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            source: source.to_string(),
            author: String::new(),
            published_at: None,
            created_at: Utc::now(),
            read_count: 0,
            status: ArticleStatus::Publish,
            image_url: String::new(),
        }
    }
}

/// Cuts `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Parses the timestamp shapes seen in page metadata and model output:
/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .as_deref()
        .and_then(parse_timestamp))
}

fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<ArticleStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .map(ArticleStatus::parse)
        .unwrap_or_default())
}
