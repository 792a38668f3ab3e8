use async_trait::async_trait;
use chrono::Utc;
use nt_core::{Article, ArticleStorage, InsertOutcome, Result, StoredArticle};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<StoredArticle>,
    next_id: i64,
}

impl MemoryStore {
    pub fn insert(&mut self, article: &Article) -> InsertOutcome {
        if !article.is_publishable() {
            return InsertOutcome::Invalid;
        }
        if self.articles.iter().any(|stored| stored.article.url == article.url) {
            return InsertOutcome::Duplicate;
        }
        self.next_id += 1;
        self.articles.push(StoredArticle {
            id: self.next_id,
            article: article.clone(),
            created_at: Utc::now(),
            read_count: 0,
        });
        InsertOutcome::Inserted
    }

    pub fn exists(&self, url: &str) -> bool {
        self.articles.iter().any(|stored| stored.article.url == url)
    }

    pub fn get_by_source(&self, source: &str) -> Vec<StoredArticle> {
        let mut articles: Vec<_> = self
            .articles
            .iter()
            .filter(|stored| stored.article.source == source)
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.article.published_at.cmp(&a.article.published_at));
        articles
    }
}

/// Process-local store; the lock makes check-and-insert atomic.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.articles.len()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_location: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        Ok(self.store.read().await.exists(url))
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        Ok(self.store.write().await.insert(article))
    }

    async fn get_by_source(&self, source: &str) -> Result<Vec<StoredArticle>> {
        Ok(self.store.read().await.get_by_source(source))
    }
}
