use crate::logging::Logger;
use crate::manager::{ArticleOutcome, TickReport};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nt_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Receives the lifecycle of one tick. Called from several site tasks at once.
pub trait ProgressReporter: Send + Sync {
    fn discovered(&self, site: &str, count: usize);
    fn article(&self, site: &str, url: &str, outcome: &ArticleOutcome);
    fn finished(&self, report: &TickReport);
}

/// Writes every event as a tracing line.
#[derive(Debug, Default)]
pub struct LogReporter;

impl LogReporter {
    fn logger(site: &str) -> Logger {
        Logger::new().with_prefix(format!("[{}]", site))
    }
}

impl ProgressReporter for LogReporter {
    fn discovered(&self, site: &str, count: usize) {
        Self::logger(site).info(&format!("{} new links", count));
    }

    fn article(&self, site: &str, url: &str, outcome: &ArticleOutcome) {
        let logger = Self::logger(site);
        match outcome {
            ArticleOutcome::Inserted => logger.info(&format!("✅ {}", url)),
            ArticleOutcome::Stale { .. } => logger.info(&format!("🛑 {} ({})", url, outcome)),
            ArticleOutcome::Failed(_) => logger.warn(&format!("⏭️ {} ({})", url, outcome)),
            _ => logger.debug(&format!("⏭️ {} ({})", url, outcome)),
        }
    }

    fn finished(&self, report: &TickReport) {
        Self::logger(&report.site).info(&report.to_string());
    }
}

/// One `indicatif` bar per site, stacked.
pub struct BarReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    style: ProgressStyle,
}

impl BarReporter {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{prefix:>14.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            style,
        }
    }

    fn with_bar(&self, site: &str, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(site) {
                f(bar);
            }
        }
    }
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarReporter {
    fn discovered(&self, site: &str, count: usize) {
        let bar = self.multi.add(ProgressBar::new(count as u64));
        bar.set_style(self.style.clone());
        bar.set_prefix(site.to_string());
        if let Ok(mut bars) = self.bars.lock() {
            if let Some(previous) = bars.insert(site.to_string(), bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn article(&self, site: &str, url: &str, outcome: &ArticleOutcome) {
        self.with_bar(site, |bar| {
            bar.set_message(format!("{} {}", outcome, url));
            bar.inc(1);
        });
    }

    fn finished(&self, report: &TickReport) {
        let bar = self.bars.lock().ok().and_then(|mut bars| bars.remove(&report.site));
        match bar {
            Some(bar) => bar.finish_with_message(report.to_string()),
            None => {
                let _ = self.multi.println(report.to_string());
            }
        }
    }
}

/// Builds the reporter named by `--progress`.
pub fn reporter_for(kind: &str) -> Result<Arc<dyn ProgressReporter>> {
    match kind {
        "log" => Ok(Arc::new(LogReporter)),
        "bar" => Ok(Arc::new(BarReporter::new())),
        other => Err(Error::Config(format!(
            "Unknown progress reporter: {} (expected log or bar)",
            other
        ))),
    }
}
