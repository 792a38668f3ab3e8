pub mod config;
pub mod error;
pub mod models;
pub mod site;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use models::{GenerationRequest, InferenceModel, ResponseShape};
pub use site::{load_sites, ContentScrub, LinkFilter, LinkRules, SiteDescriptor};
pub use storage::{ArticleStorage, InsertOutcome};
pub use types::{Article, ArticleStatus, CandidateLink, ExtractionMetadata, StoredArticle};
