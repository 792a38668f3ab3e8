use crate::fetch::PageFetcher;
use crate::page::extract_links;
use nt_core::{ArticleStorage, CandidateLink, Error, Result, SiteDescriptor};
use tracing::{debug, warn};
use url::Url;

/// Fetches the listing page and returns the article links not yet stored,
/// in page order.
pub async fn discover_links(
    site: &SiteDescriptor,
    fetcher: &dyn PageFetcher,
    storage: &dyn ArticleStorage,
) -> Result<Vec<CandidateLink>> {
    let base = Url::parse(&site.list_url)
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", site.list_url, e)))?;
    let filter = site.link_filter()?;

    let html = fetcher.fetch(&site.list_url).await?;
    let links = extract_links(&html, &base, &site.link_selector)?;
    let total = links.len();

    let mut candidates = Vec::new();
    for url in links.into_iter().filter(|url| filter.accepts(url)) {
        match storage.exists(&url).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                warn!(%url, "Stored-URL lookup failed, dropping link: {}", e);
                continue;
            }
        }
        candidates.push(CandidateLink {
            url,
            site: site.name.clone(),
        });
    }

    debug!(
        site = %site.name,
        links = total,
        candidates = candidates.len(),
        "Listing page scanned"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use nt_core::{Article, ArticleStatus, LinkRules};
    use nt_storage::backends::InMemoryStorage;
    use std::collections::HashMap;

    struct StaticPages(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for StaticPages {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.0.get(url).cloned().ok_or_else(|| Error::Fetch {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            })
        }
    }

    fn alpha() -> SiteDescriptor {
        let mut site = SiteDescriptor::new("Alpha", "https://a.test/");
        site.link_rules = Some(LinkRules::denylist(None, ["/tag/"]));
        site
    }

    fn listing(body: &str) -> StaticPages {
        StaticPages(HashMap::from([("https://a.test/".to_string(), body.to_string())]))
    }

    #[tokio::test]
    async fn test_filters_links() {
        let pages = listing(r#"<a href="/2024/05/01/x">x</a><a href="/tag/y">y</a><a href="/">home</a>"#);
        let storage = InMemoryStorage::new();

        let links = discover_links(&alpha(), &pages, &storage).await.unwrap();
        assert_eq!(
            links,
            vec![CandidateLink {
                url: "https://a.test/2024/05/01/x".to_string(),
                site: "Alpha".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_skips_stored_urls() {
        let pages = listing(r#"<a href="/2024/05/01/x">x</a><a href="/2024/05/02/z">z</a>"#);
        let storage = InMemoryStorage::new();
        storage
            .insert(&Article {
                url: "https://a.test/2024/05/01/x".to_string(),
                title: "X".to_string(),
                subtitle: String::new(),
                content: "<p>x</p>".to_string(),
                source: "Alpha".to_string(),
                published_at: Utc::now(),
                image_url: String::new(),
                status: ArticleStatus::Publish,
                author: "Alpha".to_string(),
            })
            .await
            .unwrap();

        let links = discover_links(&alpha(), &pages, &storage).await.unwrap();
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/2024/05/02/z"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let pages = StaticPages(HashMap::new());
        let storage = InMemoryStorage::new();
        let err = discover_links(&alpha(), &pages, &storage).await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
