//! Synchronous page reading.
//!
//! `scraper::Html` is not `Send`, so every document is parsed and dropped
//! inside these functions and only owned values leave them. That keeps the
//! async callers spawnable.

use chrono::{DateTime, Utc};
use nt_core::types::parse_timestamp;
use nt_core::{Error, Result, SiteDescriptor};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const AUTHOR_META: &str = "meta[name='author']";
const AUTHOR_ELEMENTS: &str = ".author, .post-author, .byline";
const JSON_LD: &str = "script[type='application/ld+json']";

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::Scraping(format!("Invalid selector {:?}: {}", selector, e)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// `content`, then `datetime`, then `src`, then the element text.
fn element_value(el: ElementRef<'_>) -> String {
    ["content", "datetime", "src"]
        .iter()
        .find_map(|attr| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| element_text(el))
}

fn first_value(document: &Html, selector: &str) -> Result<Option<String>> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .map(element_value)
        .find(|v| !v.is_empty()))
}

/// Every `href` under `selector`, resolved against `base`. Only http(s)
/// links survive; fragments are dropped and repeats collapse to the first
/// occurrence.
pub fn extract_links(html: &str, base: &Url, selector: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = parse_selector(selector)?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for el in document.select(&selector) {
        let Some(href) = el.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }
    Ok(links)
}

/// Fields read straight from an article page, before any remote help.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFields {
    pub title: String,
    pub image_url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub author: String,
    /// Inner HTML of the content region.
    pub content_html: String,
    /// Text of the first non-empty paragraph in the content region.
    pub lead: String,
}

pub fn read_article_page(html: &str, page_url: &str, site: &SiteDescriptor) -> Result<PageFields> {
    let document = Html::parse_document(html);

    let content_selector = parse_selector(&site.content_selector)?;
    let region = document
        .select(&content_selector)
        .next()
        .ok_or_else(|| Error::ContentNotFound {
            url: page_url.to_string(),
            selector: site.content_selector.clone(),
        })?;

    let paragraph = parse_selector("p")?;
    let lead = region
        .select(&paragraph)
        .map(element_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default();

    let title_selector = parse_selector(&site.title_selector)?;
    let title = document
        .select(&title_selector)
        .map(element_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default();

    let image_url = first_value(&document, &site.image_selector)?
        .map(|src| resolve(page_url, &src))
        .unwrap_or_default();

    let published_at = first_value(&document, &site.date_selector)?
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| json_ld_date(&document));

    let author = match first_value(&document, AUTHOR_META)? {
        Some(author) => author,
        None => {
            let selector = parse_selector(AUTHOR_ELEMENTS)?;
            document
                .select(&selector)
                .map(element_text)
                .find(|text| !text.is_empty())
                .unwrap_or_else(|| json_ld_authors(&document).join(", "))
        }
    };

    Ok(PageFields {
        title,
        image_url,
        published_at,
        author,
        content_html: region.inner_html(),
        lead,
    })
}

fn resolve(page_url: &str, src: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(src))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| src.to_string())
}

fn json_ld_blocks(document: &Html) -> Vec<serde_json::Value> {
    let Ok(selector) = Selector::parse(JSON_LD) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|script| {
            serde_json::from_str::<serde_json::Value>(script.text().collect::<String>().trim()).ok()
        })
        .flat_map(|json| match json {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(ref obj) if obj.contains_key("@graph") => obj
                .get("@graph")
                .and_then(|graph| graph.as_array())
                .cloned()
                .unwrap_or_default(),
            other => vec![other],
        })
        .collect()
}

fn json_ld_date(document: &Html) -> Option<DateTime<Utc>> {
    json_ld_blocks(document)
        .iter()
        .filter_map(|block| block.get("datePublished").and_then(|d| d.as_str()))
        .find_map(parse_timestamp)
}

fn json_ld_authors(document: &Html) -> Vec<String> {
    let mut authors = Vec::new();
    for block in json_ld_blocks(document) {
        match block.get("author") {
            Some(serde_json::Value::Array(arr)) => {
                for author in arr {
                    if let Some(name) = author.get("name").and_then(|n| n.as_str()) {
                        authors.push(name.trim().to_string());
                    }
                }
            }
            Some(serde_json::Value::Object(obj)) => {
                if let Some(name) = obj.get("name").and_then(|n| n.as_str()) {
                    authors.push(name.trim().to_string());
                }
            }
            Some(serde_json::Value::String(s)) => authors.push(s.trim().to_string()),
            _ => {}
        }
    }
    authors.retain(|a| !a.is_empty());
    authors.dedup();
    authors
}
