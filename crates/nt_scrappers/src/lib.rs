pub mod cli;
pub mod discovery;
pub mod extractor;
pub mod fetch;
pub mod logging;
pub mod manager;
pub mod normalize;
pub mod page;
pub mod progress;
pub mod recency;
pub mod schedule;

pub use extractor::ArticleExtractor;
pub use fetch::{HttpFetcher, PageFetcher};
pub use manager::{ArticleOutcome, ScraperManager, TickReport};
pub use progress::{BarReporter, LogReporter, ProgressReporter};
pub use recency::RecencyGate;
pub use schedule::HumanDuration;

pub mod prelude {
    pub use super::cli::{handle_command, ScraperCommands};
    pub use super::logging::{init_logging, Logger};
    pub use super::progress::reporter_for;
    pub use super::schedule::{run_schedule, spawn_site, DEFAULT_INTERVAL};
    pub use super::{
        ArticleOutcome, HttpFetcher, PageFetcher, ProgressReporter, ScraperManager, TickReport,
    };
}
