use crate::manager::ScraperManager;
use crate::schedule::{run_schedule, HumanDuration};
use clap::Subcommand;
use nt_core::{ArticleStorage, Error, Result, SiteDescriptor};
use std::sync::Arc;

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Ingest every site now, then again on every interval
    Run {
        /// Time between ticks (e.g. 1h, 30m, 1d, 1h15m)
        #[arg(short, long, default_value = "1h")]
        interval: HumanDuration,
    },
    /// Run a single tick, for one site or for all of them
    Once {
        /// Site name as written in the sites file
        site: Option<String>,
    },
    /// List the configured sites
    List,
    /// Extract one article and print it without storing it
    Url {
        site: String,
        url: String,
    },
    /// Print the stored articles of a source, newest first
    Articles {
        source: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

pub fn find_site<'a>(sites: &'a [SiteDescriptor], name: &str) -> Result<&'a SiteDescriptor> {
    sites
        .iter()
        .find(|site| site.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            let known: Vec<_> = sites.iter().map(|s| s.name.as_str()).collect();
            Error::Config(format!("Unknown site {:?} (configured: {})", name, known.join(", ")))
        })
}

pub async fn handle_command(
    command: ScraperCommands,
    manager: Arc<ScraperManager>,
    sites: Vec<SiteDescriptor>,
) -> Result<()> {
    match command {
        ScraperCommands::Run { interval } => {
            run_schedule(manager, sites, interval.0).await;
        }
        ScraperCommands::Once { site } => {
            let selected = match site {
                Some(name) => vec![find_site(&sites, &name)?.clone()],
                None => sites,
            };
            for report in manager.scrape_sites(&selected).await {
                println!("{}: {}", report.site, report);
            }
        }
        ScraperCommands::List => {
            println!("Configured sites:");
            for site in &sites {
                let rules = site.effective_link_rules();
                let filter = if rules.is_empty() { "all links" } else { "filtered links" };
                println!("  {} - {} ({})", site.name, site.list_url, filter);
            }
        }
        ScraperCommands::Url { site, url } => {
            let site = find_site(&sites, &site)?;
            let article = manager.scrape_url(&url, site).await?;
            println!("📰 {}", article.title);
            println!("   {} | {} | {}", article.source, article.author, article.published_at.format("%Y-%m-%d %H:%M"));
            if !article.subtitle.is_empty() {
                println!("   {}", article.subtitle);
            }
            if !article.image_url.is_empty() {
                println!("   🖼️ {}", article.image_url);
            }
            println!();
            println!("{}", article.content);
        }
        ScraperCommands::Articles { source, limit } => {
            let articles = manager.storage().get_by_source(&source).await?;
            println!("{} stored articles from {}", articles.len(), source);
            for stored in articles.iter().take(limit) {
                println!(
                    "  #{} {} {} ({})",
                    stored.id,
                    stored.article.published_at.format("%Y-%m-%d"),
                    stored.article.title,
                    stored.article.url
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_site() {
        let sites = vec![
            SiteDescriptor::new("Katolikana", "https://www.katolikana.com/"),
            SiteDescriptor::new("sesawi.net", "https://www.sesawi.net/"),
        ];
        assert_eq!(find_site(&sites, "katolikana").unwrap().name, "Katolikana");
        assert!(matches!(find_site(&sites, "clarin"), Err(Error::Config(_))));
    }
}
