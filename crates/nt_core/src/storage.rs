use async_trait::async_trait;
use crate::types::{Article, StoredArticle};
use crate::Result;

/// What an insert did. Only `Inserted` writes a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same URL already exists.
    Duplicate,
    /// Empty title or content; nothing was written.
    Invalid,
}

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// True iff an article with exactly this URL is stored.
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Upsert-ignore on the URL key.
    async fn insert(&self, article: &Article) -> Result<InsertOutcome>;

    /// Get all articles from a specific source, newest first
    async fn get_by_source(&self, source: &str) -> Result<Vec<StoredArticle>>;
}
