use crate::manager::ScraperManager;
use futures::future::join_all;
use nt_core::SiteDescriptor;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);

/// Durations such as `30m`, `1h15m`, `1d` or a bare number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();

        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            let num = current_number
                .parse::<u64>()
                .map_err(|_| format!("Expected a number before '{}'", c))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = num
                .checked_mul(unit)
                .and_then(|secs| total_seconds.checked_add(secs))
                .ok_or_else(|| "Duration too large".to_string())?;
            current_number.clear();
        }

        if !current_number.is_empty() {
            let secs = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(secs)
                .ok_or_else(|| "Duration too large".to_string())?;
        }

        if total_seconds == 0 {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

/// Runs `job` now and then once per `period`. A slow run delays the next
/// one instead of stacking up.
pub fn spawn_every<F, Fut>(period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            job().await;
        }
    })
}

pub fn spawn_site(manager: Arc<ScraperManager>, site: SiteDescriptor, period: Duration) -> JoinHandle<()> {
    let site = Arc::new(site);
    spawn_every(period, move || {
        let manager = manager.clone();
        let site = site.clone();
        async move {
            manager.scrape_site(&site).await;
        }
    })
}

/// One independent task per site. Returns only if every task ends.
pub async fn run_schedule(manager: Arc<ScraperManager>, sites: Vec<SiteDescriptor>, period: Duration) {
    info!(sites = sites.len(), every_secs = period.as_secs(), "Starting scheduled ingestion");
    let handles: Vec<_> = sites
        .into_iter()
        .map(|site| spawn_site(manager.clone(), site, period))
        .collect();

    for result in join_all(handles).await {
        if let Err(e) = result {
            error!("Site task ended: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_human_duration() {
        let parse = |s: &str| s.parse::<HumanDuration>().map(|d| d.0.as_secs());
        assert_eq!(parse("30m"), Ok(1800));
        assert_eq!(parse("1h15m"), Ok(4500));
        assert_eq!(parse("1d"), Ok(86400));
        assert_eq!(parse("90"), Ok(90));
        assert!(parse("0").is_err());
        assert!(parse("").is_err());
        assert!(parse("1w").is_err());
        assert!(parse("h").is_err());
    }

    #[test]
    fn test_human_duration_overflow_is_an_error() {
        let err = "999999999999999999d".parse::<HumanDuration>().unwrap_err();
        assert_eq!(err, "Duration too large");
        assert!("18446744073709551615s1s".parse::<HumanDuration>().is_err());
    }

    #[tokio::test]
    async fn test_runs_immediately_then_waits() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = spawn_every(Duration::from_secs(3600), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        handle.abort();
    }

    #[tokio::test]
    async fn test_repeats_every_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = spawn_every(Duration::from_millis(20), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();
        assert!(runs.load(Ordering::SeqCst) >= 3);
    }
}
