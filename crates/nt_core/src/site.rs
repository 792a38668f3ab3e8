//! Per-site configuration: where the listing lives, which selectors pull
//! fields out of an article page, and which links count as articles.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_image_selector() -> String {
    "meta[property='og:image']".to_string()
}

/// Post-processing applied to a rendered article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentScrub {
    /// Image paragraph + `/author/` link paragraph + bio paragraph appended
    /// after the body by some WordPress author-box plugins.
    AuthorBioBlock,
}

/// URL-shape rules for a site's listing page. An empty rule set accepts
/// every link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRules {
    /// Regex the absolute URL must match.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Substring the absolute URL must contain.
    #[serde(default)]
    pub contains: Option<String>,
    /// Substrings that disqualify a URL.
    #[serde(default)]
    pub deny: Vec<String>,
    /// Reject the listing URL itself and the bare site root.
    #[serde(default)]
    pub reject_root: bool,
}

impl LinkRules {
    pub fn date_path() -> Self {
        Self {
            pattern: Some(r"/\d{4}/\d{2}/\d{2}/".to_string()),
            ..Self::default()
        }
    }

    pub fn denylist<I, S>(contains: Option<&str>, deny: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pattern: None,
            contains: contains.map(str::to_string),
            deny: deny.into_iter().map(Into::into).collect(),
            reject_root: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.contains.is_none() && self.deny.is_empty() && !self.reject_root
    }

    pub fn compile(&self, listing_url: &str) -> Result<LinkFilter> {
        let pattern = match &self.pattern {
            Some(p) => Some(
                Regex::new(p).map_err(|e| Error::Config(format!("Invalid link pattern {p:?}: {e}")))?,
            ),
            None => None,
        };

        let mut roots = vec![listing_url.trim_end_matches('/').to_string()];
        if let Ok(parsed) = Url::parse(listing_url) {
            roots.push(parsed.origin().ascii_serialization());
        }

        Ok(LinkFilter {
            pattern,
            contains: self.contains.clone(),
            deny: self.deny.clone(),
            roots: if self.reject_root { roots } else { Vec::new() },
        })
    }
}

/// Compiled form of [`LinkRules`].
#[derive(Debug, Clone)]
pub struct LinkFilter {
    pattern: Option<Regex>,
    contains: Option<String>,
    deny: Vec<String>,
    roots: Vec<String>,
}

impl LinkFilter {
    pub fn accepts(&self, url: &str) -> bool {
        if self.deny.iter().any(|d| url.contains(d.as_str())) {
            return false;
        }
        let bare = url.trim_end_matches('/');
        if self.roots.iter().any(|root| root == bare) {
            return false;
        }
        if let Some(contains) = &self.contains {
            if !url.contains(contains.as_str()) {
                return false;
            }
        }
        match &self.pattern {
            Some(re) => re.is_match(url),
            None => true,
        }
    }
}

/// Immutable description of one news site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub name: String,
    #[serde(alias = "listing_url")]
    pub list_url: String,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
    pub title_selector: String,
    #[serde(alias = "content_sel")]
    pub content_selector: String,
    #[serde(alias = "image_sel", default = "default_image_selector")]
    pub image_selector: String,
    #[serde(alias = "date_meta")]
    pub date_selector: String,
    #[serde(default)]
    pub link_rules: Option<LinkRules>,
    #[serde(default)]
    pub scrub: Option<Vec<ContentScrub>>,
}

impl SiteDescriptor {
    pub fn new(name: &str, list_url: &str) -> Self {
        Self {
            name: name.to_string(),
            list_url: list_url.to_string(),
            link_selector: default_link_selector(),
            title_selector: "h1".to_string(),
            content_selector: "article".to_string(),
            image_selector: default_image_selector(),
            date_selector: "meta[property='article:published_time']".to_string(),
            link_rules: None,
            scrub: None,
        }
    }

    /// Configured rules, or the preset known for this site name.
    pub fn effective_link_rules(&self) -> LinkRules {
        if let Some(rules) = &self.link_rules {
            return rules.clone();
        }
        match self.name.as_str() {
            "Katolikana" => LinkRules::date_path(),
            "sesawi.net" => LinkRules::denylist(
                Some("sesawi.net/"),
                ["/category/", "/tag/", "/author/", "/wp-"],
            ),
            _ => LinkRules::default(),
        }
    }

    pub fn effective_scrubs(&self) -> Vec<ContentScrub> {
        if let Some(scrub) = &self.scrub {
            return scrub.clone();
        }
        match self.name.as_str() {
            "Katolikana" => vec![ContentScrub::AuthorBioBlock],
            _ => Vec::new(),
        }
    }

    pub fn link_filter(&self) -> Result<LinkFilter> {
        self.effective_link_rules().compile(&self.list_url)
    }
}

/// Reads the ordered site list from a YAML file.
pub fn load_sites(path: impl AsRef<Path>) -> Result<Vec<SiteDescriptor>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_sites(&raw)
}

pub fn parse_sites(raw: &str) -> Result<Vec<SiteDescriptor>> {
    let sites: Vec<SiteDescriptor> = serde_yaml::from_str(raw)?;
    for site in &sites {
        Url::parse(&site.list_url)
            .map_err(|e| Error::InvalidUrl(format!("{} ({}): {}", site.list_url, site.name, e)))?;
        site.link_filter()?;
    }
    Ok(sites)
}
