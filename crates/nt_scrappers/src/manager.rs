use crate::discovery::discover_links;
use crate::extractor::ArticleExtractor;
use crate::fetch::PageFetcher;
use crate::logging::Logger;
use crate::progress::{LogReporter, ProgressReporter};
use crate::recency::RecencyGate;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use nt_core::{Article, ArticleStorage, Error, InferenceModel, InsertOutcome, Result, Settings, SiteDescriptor};
use nt_inference::RemoteExtractor;
use std::fmt;
use std::sync::Arc;

/// What happened to one candidate link.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleOutcome {
    Inserted,
    Duplicate,
    Invalid,
    Failed(String),
    Stale { published_at: DateTime<Utc> },
}

impl fmt::Display for ArticleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleOutcome::Inserted => f.write_str("inserted"),
            ArticleOutcome::Duplicate => f.write_str("already stored"),
            ArticleOutcome::Invalid => f.write_str("empty title or content"),
            ArticleOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            ArticleOutcome::Stale { published_at } => {
                write!(f, "published {}, stopping", published_at.format("%Y-%m-%d"))
            }
        }
    }
}

/// Counts for one site and one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub site: String,
    pub discovered: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub old: usize,
}

impl TickReport {
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &ArticleOutcome) {
        match outcome {
            ArticleOutcome::Inserted => self.inserted += 1,
            ArticleOutcome::Stale { .. } => self.old += 1,
            ArticleOutcome::Duplicate | ArticleOutcome::Invalid | ArticleOutcome::Failed(_) => {
                self.skipped += 1
            }
        }
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} links, {} inserted, {} skipped, {} old",
            self.discovered, self.inserted, self.skipped, self.old
        )
    }
}

/// Runs ticks: discover, extract in listing order, persist, tally.
pub struct ScraperManager {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: ArticleExtractor,
    reporter: Arc<dyn ProgressReporter>,
}

impl ScraperManager {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        fetcher: Arc<dyn PageFetcher>,
        model: Arc<dyn InferenceModel>,
        settings: &Settings,
    ) -> Self {
        let extractor = ArticleExtractor::new(
            fetcher.clone(),
            RemoteExtractor::new(model, settings.max_html_chars),
            RecencyGate::new(settings.recency_window()),
        );
        Self {
            storage,
            fetcher,
            extractor,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStorage> {
        &self.storage
    }

    /// Extracts one article without storing it.
    pub async fn scrape_url(&self, url: &str, site: &SiteDescriptor) -> Result<Article> {
        self.extractor.extract(url, site).await
    }

    /// One tick for one site. Never fails; problems end up in the counts
    /// and the log.
    pub async fn scrape_site(&self, site: &SiteDescriptor) -> TickReport {
        let logger = Logger::new().with_prefix(format!("[{}]", site.name));
        let mut report = TickReport::new(&site.name);

        let links = match discover_links(site, self.fetcher.as_ref(), self.storage.as_ref()).await {
            Ok(links) => links,
            Err(e) => {
                logger.error(&format!("Listing discovery failed: {}", e));
                Vec::new()
            }
        };
        report.discovered = links.len();
        self.reporter.discovered(&site.name, links.len());

        for link in &links {
            let outcome = self.process(&link.url, site).await;
            report.record(&outcome);
            self.reporter.article(&site.name, &link.url, &outcome);
            if matches!(outcome, ArticleOutcome::Stale { .. }) {
                break;
            }
        }

        self.reporter.finished(&report);
        report
    }

    /// One tick for every site, concurrently.
    pub async fn scrape_sites(&self, sites: &[SiteDescriptor]) -> Vec<TickReport> {
        join_all(sites.iter().map(|site| self.scrape_site(site))).await
    }

    async fn process(&self, url: &str, site: &SiteDescriptor) -> ArticleOutcome {
        let article = match self.extractor.extract(url, site).await {
            Ok(article) => article,
            Err(Error::StaleArticle { published_at }) => {
                return ArticleOutcome::Stale { published_at }
            }
            Err(e) => return ArticleOutcome::Failed(e.to_string()),
        };

        match self.storage.insert(&article).await {
            Ok(InsertOutcome::Inserted) => ArticleOutcome::Inserted,
            Ok(InsertOutcome::Duplicate) => ArticleOutcome::Duplicate,
            Ok(InsertOutcome::Invalid) => ArticleOutcome::Invalid,
            Err(e) => ArticleOutcome::Failed(e.to_string()),
        }
    }
}
