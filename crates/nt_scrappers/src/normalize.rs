use chrono::{DateTime, Utc};
use comrak::ComrakOptions;
use lazy_static::lazy_static;
use nt_core::ContentScrub;
use regex::Regex;
use tracing::warn;

lazy_static! {
    /// Author photo paragraph, `/author/` link paragraph, then the bio paragraph.
    static ref AUTHOR_BIO_BLOCK: Regex = Regex::new(
        r"(?s)<p><img[^>]+></p>\s*<p><a[^>]+/author/[^>]*>.*?</a></p>\s*<p>.*?</p>"
    )
    .expect("author bio pattern is valid");
}

fn markdown_options() -> ComrakOptions {
    let mut options = ComrakOptions::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.render.hardbreaks = true;
    options.render.unsafe_ = true;
    options
}

/// GitHub-flavoured Markdown to HTML. Raw HTML in the input is passed
/// through and single newlines become `<br />`.
pub fn markdown_to_html(markdown: &str) -> String {
    comrak::markdown_to_html(markdown, &markdown_options())
}

/// Local fallback when the remote content phase fails. Returns the input
/// unchanged if it cannot be converted.
pub fn html_to_markdown(html: &str) -> String {
    match htmd::convert(html) {
        Ok(markdown) => markdown,
        Err(e) => {
            warn!("HTML to Markdown conversion failed: {}", e);
            html.to_string()
        }
    }
}

pub fn strip_author_bio(html: &str) -> String {
    AUTHOR_BIO_BLOCK.replace_all(html, "").into_owned()
}

pub fn scrub(html: String, scrubs: &[ContentScrub]) -> String {
    scrubs.iter().fold(html, |html, scrub| match scrub {
        ContentScrub::AuthorBioBlock => strip_author_bio(&html),
    })
}

/// Header fields printed above every article body.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    pub source: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub published_at: DateTime<Utc>,
}

impl Envelope<'_> {
    pub fn render(&self, body: &str) -> String {
        format!(
            r#"<div class="container mt-4">
    <h5><strong>{source}</strong></h5>
    <h1>{title}</h1>
    <p class="text-muted">By {author} - {date}</p>
    <div class="article-content">
{body}
    </div>
</div>"#,
            source = html_escape::encode_text(self.source),
            title = html_escape::encode_text(self.title),
            author = html_escape::encode_text(self.author),
            date = self.published_at.format("%B %-d, %Y"),
            body = body,
        )
    }
}
