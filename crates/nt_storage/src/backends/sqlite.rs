use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nt_core::{Article, ArticleStatus, ArticleStorage, Error, InsertOutcome, Result, StoredArticle};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::StorageBackend;

const DEFAULT_DB_PATH: &str = "news.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        subtitle TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL,
        source TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        published_at TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        read_count INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'publish',
        image_url TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT ''
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_news_source ON news(source)",
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the --database path (default ./news.db)"
    }

    async fn open(location: Option<&str>) -> Result<Self> {
        let db_path = PathBuf::from(location.unwrap_or(DEFAULT_DB_PATH));
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn parse_stored_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse date {raw:?}: {e}")))
}

fn row_to_article(row: &SqliteRow) -> Result<StoredArticle> {
    Ok(StoredArticle {
        id: row.get("id"),
        article: Article {
            url: row.get("url"),
            title: row.get("title"),
            subtitle: row.get("subtitle"),
            content: row.get("content"),
            source: row.get("source"),
            published_at: parse_stored_time(row.get::<&str, _>("published_at"))?,
            image_url: row.get("image_url"),
            status: ArticleStatus::parse(row.get::<&str, _>("status")),
            author: row.get("author"),
        },
        created_at: parse_stored_time(row.get::<&str, _>("created_at"))?,
        read_count: row.get("read_count"),
    })
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT id FROM news WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to look up {}: {}", url, e)))?;
        Ok(row.is_some())
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        if !article.is_publishable() {
            debug!(url = %article.url, "Skipping insert of article with empty title or content");
            return Ok(InsertOutcome::Invalid);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO news
            (title, subtitle, content, source, url, published_at, read_count, status, image_url, author)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&article.title)
        .bind(&article.subtitle)
        .bind(&article.content)
        .bind(&article.source)
        .bind(&article.url)
        .bind(article.published_at.to_rfc3339())
        .bind(article.status.as_str())
        .bind(&article.image_url)
        .bind(&article.author)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to store article: {}", e)))?;

        Ok(if result.rows_affected() == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }

    async fn get_by_source(&self, source: &str) -> Result<Vec<StoredArticle>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM news
            WHERE source = ?
            ORDER BY published_at DESC
            "#,
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get articles by source: {}", e)))?;

        rows.iter().map(row_to_article).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn article(url: &str) -> Article {
        Article {
            url: url.to_string(),
            title: "Test Article".to_string(),
            subtitle: "Lead paragraph".to_string(),
            content: "<p>Test content</p>".to_string(),
            source: "test".to_string(),
            published_at: Utc::now() - Duration::hours(3),
            image_url: "https://example.com/hero.jpg".to_string(),
            status: ArticleStatus::Publish,
            author: "Someone".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();

        let a = article("http://example.com/a");
        assert!(!storage.exists(&a.url).await.unwrap());
        assert_eq!(storage.insert(&a).await.unwrap(), InsertOutcome::Inserted);
        assert!(storage.exists(&a.url).await.unwrap());

        let stored = storage.get_by_source("test").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].article.title, "Test Article");
        assert_eq!(stored[0].read_count, 0);
        assert_eq!(stored[0].article.published_at.timestamp(), a.published_at.timestamp());
        assert!(stored[0].created_at > a.published_at);
    }

    #[tokio::test]
    async fn test_duplicate_url_is_ignored() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("dup.db")).await.unwrap();

        let a = article("http://example.com/dup");
        let mut b = article("http://example.com/dup");
        b.title = "Rewritten".to_string();

        assert_eq!(storage.insert(&a).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(storage.insert(&b).await.unwrap(), InsertOutcome::Duplicate);

        let stored = storage.get_by_source("test").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].article.title, "Test Article");
    }

    #[tokio::test]
    async fn test_invalid_article_is_not_written() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("invalid.db")).await.unwrap();

        let mut a = article("http://example.com/empty");
        a.content = String::new();
        assert_eq!(storage.insert(&a).await.unwrap(), InsertOutcome::Invalid);
        assert!(!storage.exists(&a.url).await.unwrap());
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("news.db");
        {
            let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
            storage.insert(&article("http://example.com/keep")).await.unwrap();
            assert_eq!(storage.get_db_path(), db_path.as_path());
        }
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        assert!(storage.exists("http://example.com/keep").await.unwrap());
    }
}
