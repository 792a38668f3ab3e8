use clap::Parser;
use nt_core::{load_sites, ArticleStorage, Error, Result, Settings};
use nt_inference::{create_model, Config};
use nt_scrappers::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const HEALTH_CHECK_URL: &str = "nt://storage-health-check";

#[derive(Parser, Debug)]
#[command(author, version, about = "Scheduled news ingestion", long_about = None)]
pub struct Cli {
    /// YAML file listing the sites to ingest
    #[arg(long, default_value = "sites.yaml")]
    sites: String,
    /// Storage backend: sqlite or memory
    #[arg(long, default_value = "sqlite")]
    storage: String,
    /// SQLite database file
    #[arg(long, default_value = "news.db")]
    database: String,
    #[arg(long, default_value = "gemini", help = "Extraction model: gemini (default), deepseek, dummy")]
    model: String,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long)]
    model_name: Option<String>,
    /// Overrides the model's API endpoint
    #[arg(long)]
    model_url: Option<String>,
    /// Remote extraction timeout in seconds
    #[arg(long, default_value_t = 60)]
    model_timeout: u64,
    /// Articles older than this many days stop a listing
    #[arg(long, default_value_t = 7)]
    recency_days: i64,
    /// Character cap on HTML sent to the model
    #[arg(long, default_value_t = 4000)]
    max_html_chars: usize,
    /// Progress output: log or bar
    #[arg(long, default_value = "log")]
    progress: String,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: ScraperCommands,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            recency_days: self.recency_days,
            max_html_chars: self.max_html_chars,
            inference_timeout: Duration::from_secs(self.model_timeout),
            ..Settings::default()
        }
    }

    /// Only these commands talk to the extraction service.
    fn needs_model(&self) -> bool {
        matches!(
            self.command,
            ScraperCommands::Run { .. } | ScraperCommands::Once { .. } | ScraperCommands::Url { .. }
        )
    }
}

async fn check_storage(storage: &Arc<dyn ArticleStorage>, kind: &str) -> Result<()> {
    match tokio::time::timeout(Duration::from_secs(10), storage.exists(HEALTH_CHECK_URL)).await {
        Ok(Ok(_)) => {
            info!("💾 Storage ready (using {})", kind);
            Ok(())
        }
        Ok(Err(e)) => Err(Error::Storage(format!("Storage health check failed: {}", e))),
        Err(_) => Err(Error::Storage("Storage health check timed out".to_string())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let settings = cli.settings();

    let sites = load_sites(&cli.sites)?;
    info!("🗞️ Loaded {} sites from {}", sites.len(), cli.sites);

    let storage = nt_storage::create_storage(&cli.storage, Some(cli.database.as_str())).await?;
    check_storage(&storage, &cli.storage).await?;

    let model_kind = if cli.needs_model() { cli.model.as_str() } else { "dummy" };
    let model = create_model(
        model_kind,
        Config {
            api_key: cli.api_key.clone(),
            model_name: cli.model_name.clone(),
            base_url: cli.model_url.clone(),
            timeout: settings.inference_timeout,
        },
    )?;
    info!("🧠 Extraction model ready (using {})", model.name());

    let fetcher = Arc::new(HttpFetcher::new(&settings)?);
    let manager = ScraperManager::new(storage, fetcher, model, &settings)
        .with_reporter(reporter_for(&cli.progress)?);

    handle_command(cli.command, Arc::new(manager), sites).await
}
