//! Turns one article URL into an [`Article`].
//!
//! The page is read locally first. The remote service then gets two tries,
//! one for metadata and one for the Markdown body; each falls back to the
//! local reading on its own. The recency gate runs last, on the merged date.

use crate::fetch::PageFetcher;
use crate::normalize::{html_to_markdown, markdown_to_html, scrub, Envelope};
use crate::page::{read_article_page, PageFields};
use crate::recency::RecencyGate;
use chrono::{DateTime, Utc};
use nt_core::types::{truncate_chars, SUBTITLE_MAX_CHARS};
use nt_core::{Article, ExtractionMetadata, Result, SiteDescriptor};
use nt_inference::RemoteExtractor;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ArticleExtractor {
    fetcher: Arc<dyn PageFetcher>,
    remote: RemoteExtractor,
    gate: RecencyGate,
}

impl ArticleExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, remote: RemoteExtractor, gate: RecencyGate) -> Self {
        Self {
            fetcher,
            remote,
            gate,
        }
    }

    pub async fn extract(&self, url: &str, site: &SiteDescriptor) -> Result<Article> {
        let html = self.fetcher.fetch(url).await?;
        let page = read_article_page(&html, url, site)?;

        let meta = match self.remote.extract_metadata(&page.content_html, &site.name).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(%url, model = self.remote.model_name(), "Metadata extraction failed, using page fields: {}", e);
                ExtractionMetadata::empty(&site.name)
            }
        };

        let markdown = match self.remote.extract_content(&page.content_html).await {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!(%url, model = self.remote.model_name(), "Content extraction failed, converting locally: {}", e);
                html_to_markdown(&page.content_html)
            }
        };

        let body = scrub(markdown_to_html(&markdown), &site.effective_scrubs());
        let now = Utc::now();
        let article = assemble(url, site, page, meta, &body, now);
        debug!(%url, title = %article.title, published_at = %article.published_at, "Article assembled");

        self.gate.check(article.published_at, now)?;
        Ok(article)
    }
}

fn prefer(remote: String, local: String) -> String {
    if remote.trim().is_empty() {
        local
    } else {
        remote
    }
}

/// Merges page fields with remote metadata and fills the defaults. An empty
/// body yields empty `content` so the article is never stored.
pub fn assemble(
    url: &str,
    site: &SiteDescriptor,
    page: PageFields,
    meta: ExtractionMetadata,
    body: &str,
    now: DateTime<Utc>,
) -> Article {
    let title = prefer(meta.title, page.title);
    let subtitle = truncate_chars(&prefer(meta.subtitle, page.lead), SUBTITLE_MAX_CHARS);
    let image_url = prefer(meta.image_url, page.image_url);
    let author = prefer(prefer(meta.author, page.author), site.name.clone());
    let published_at = meta.published_at.or(page.published_at).unwrap_or(now);

    let content = if body.trim().is_empty() {
        String::new()
    } else {
        Envelope {
            source: &site.name,
            title: &title,
            author: &author,
            published_at,
        }
        .render(body)
    };

    Article {
        url: url.to_string(),
        title,
        subtitle,
        content,
        source: site.name.clone(),
        published_at,
        image_url,
        status: meta.status,
        author,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn page() -> PageFields {
        PageFields {
            title: "Local title".to_string(),
            image_url: "https://a.test/local.jpg".to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap()),
            author: String::new(),
            content_html: "<p>Lead</p>".to_string(),
            lead: "y".repeat(250),
        }
    }

    #[test]
    fn test_local_fields_fill_defaults() {
        let site = SiteDescriptor::new("Alpha", "https://a.test/");
        let now = Utc::now();
        let article = assemble(
            "https://a.test/x",
            &site,
            page(),
            ExtractionMetadata::empty("Alpha"),
            "<p>Lead</p>",
            now,
        );

        assert_eq!(article.title, "Local title");
        assert_eq!(article.author, "Alpha");
        assert_eq!(article.source, "Alpha");
        assert_eq!(article.subtitle.chars().count(), SUBTITLE_MAX_CHARS);
        assert_eq!(article.published_at, Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap());
        assert!(article.content.contains("<h1>Local title</h1>"));
        assert!(article.content.contains("By Alpha - May 1, 2024"));
    }

    #[test]
    fn test_remote_fields_override() {
        let site = SiteDescriptor::new("Alpha", "https://a.test/");
        let mut meta = ExtractionMetadata::empty("Alpha");
        meta.title = "Remote title".to_string();
        meta.author = "Romo Budi".to_string();
        meta.subtitle = "Short lead".to_string();
        meta.published_at = Some(Utc::now() - Duration::hours(1));

        let article = assemble("https://a.test/x", &site, page(), meta.clone(), "<p>b</p>", Utc::now());
        assert_eq!(article.title, "Remote title");
        assert_eq!(article.author, "Romo Budi");
        assert_eq!(article.subtitle, "Short lead");
        assert_eq!(Some(article.published_at), meta.published_at);
        assert_eq!(article.image_url, "https://a.test/local.jpg");
    }

    #[test]
    fn test_missing_date_and_empty_body() {
        let site = SiteDescriptor::new("Alpha", "https://a.test/");
        let mut fields = page();
        fields.published_at = None;
        let now = Utc::now();

        let article = assemble("https://a.test/x", &site, fields, ExtractionMetadata::empty("Alpha"), "  \n", now);
        assert_eq!(article.published_at, now);
        assert!(article.content.is_empty());
        assert!(!article.is_publishable());
    }
}
