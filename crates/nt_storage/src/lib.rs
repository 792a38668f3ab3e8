use async_trait::async_trait;
use nt_core::{ArticleStorage, Error, Result};
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;

    /// Opens the backend. `location` is backend specific (a file path for
    /// SQLite, ignored by the in-memory store).
    async fn open(location: Option<&str>) -> Result<Self>
    where
        Self: Sized;
}

async fn open_backend<T>(location: Option<&str>) -> Result<Arc<dyn ArticleStorage>>
where
    T: StorageBackend + ArticleStorage + 'static,
{
    match T::open(location).await {
        Ok(storage) => Ok(Arc::new(storage)),
        Err(e) => Err(Error::Storage(format!("{} ({})", e, T::get_error_message()))),
    }
}

/// Builds the store named by `kind` (`sqlite` or `memory`).
pub async fn create_storage(kind: &str, location: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    let storage = match kind {
        "memory" => open_backend::<InMemoryStorage>(location).await?,
        #[cfg(feature = "sqlite")]
        "sqlite" => open_backend::<SQLiteStorage>(location).await?,
        other => {
            return Err(Error::Config(format!(
                "Unknown storage backend: {other} (expected sqlite or memory)"
            )))
        }
    };
    info!(backend = kind, "Storage backend opened");
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_storage_by_name() {
        let storage = create_storage("memory", None).await.unwrap();
        assert!(!storage.exists("https://a.test/x").await.unwrap());

        let err = create_storage("qdrant", None).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
