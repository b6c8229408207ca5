use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::alerts::{Alert, collect_alerts};
use crate::config::EngineConfig;
use crate::diff::{DiffStatus, StreakDiff, diff_snapshots};
use crate::fixtures::TeamFixtureResolver;
use crate::match_data::MatchTable;
use crate::name_match::MatcherChain;
use crate::odds_feed::{QuoteFeed, QuoteSource};
use crate::records::{TeamReport, compute_reports};
use crate::snapshot::{Snapshot, load_prior, quarantine, write_snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Loaded { source: String, entries: usize },
    Unavailable { source: String, reason: String },
}

impl FeedStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FeedStatus::Loaded { .. })
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub reports: Vec<TeamReport>,
    pub alerts: Vec<Alert>,
    pub diff: StreakDiff,
    pub feed_status: FeedStatus,
    pub snapshot_path: PathBuf,
    /// Where a corrupt prior snapshot was moved before the new one was written.
    pub quarantined: Option<PathBuf>,
}

/// One full run. The prior snapshot is read before anything is computed and the new one
/// is written last; any error before that point leaves the prior file untouched.
pub fn run_batch(
    config: &EngineConfig,
    table: &MatchTable,
    source: &dyn QuoteSource,
) -> Result<BatchOutcome> {
    let started = Instant::now();
    let prior = load_prior(&config.snapshot_path);

    let mut reports = compute_reports(
        table,
        &config.catalog,
        &config.conditions,
        &config.leagues,
        config.parallelism,
    );

    let sport_keys = config
        .catalog
        .feed_sport_keys(reports.iter().map(|r| r.league.as_str()));
    let (feed, feed_status) = fetch_feed(source, &sport_keys);
    let resolver = TeamFixtureResolver::new(feed.as_ref(), MatcherChain::standard());
    for report in &mut reports {
        report.fixture = resolver.resolve(&report.team);
    }

    let alerts = collect_alerts(&reports);
    let snapshot = Snapshot::from_reports(&reports);
    let diff = diff_snapshots(&prior, &snapshot);
    match &diff.status {
        DiffStatus::Compared => {}
        DiffStatus::NoPriorState => info!("no prior snapshot, streak comparison skipped"),
        DiffStatus::PriorCorrupt(reason) => {
            warn!(reason = %reason, "prior snapshot corrupt, streak comparison skipped")
        }
    }

    let quarantined = if prior.is_corrupt() {
        let moved = quarantine(&config.snapshot_path).with_context(|| {
            format!(
                "refusing to overwrite corrupt snapshot {}",
                config.snapshot_path.display()
            )
        })?;
        warn!(path = %moved.display(), "corrupt snapshot moved aside");
        Some(moved)
    } else {
        None
    };

    write_snapshot(&config.snapshot_path, &snapshot)
        .with_context(|| format!("write snapshot {}", config.snapshot_path.display()))?;

    info!(
        teams = reports.len(),
        alerts = alerts.len(),
        broken = diff.broken_count(),
        active = diff.active_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch complete"
    );

    Ok(BatchOutcome {
        reports,
        alerts,
        diff,
        feed_status,
        snapshot_path: config.snapshot_path.clone(),
        quarantined,
    })
}

fn fetch_feed(source: &dyn QuoteSource, sport_keys: &[String]) -> (Option<QuoteFeed>, FeedStatus) {
    let name = source.name().to_string();
    match source.fetch(sport_keys) {
        Ok(feed) => {
            info!(source = %name, entries = feed.len(), "quote feed loaded");
            let status = FeedStatus::Loaded {
                source: name,
                entries: feed.len(),
            };
            (Some(feed), status)
        }
        Err(err) => {
            warn!(source = %name, error = %err, "quote feed unavailable, fixtures degraded");
            (
                None,
                FeedStatus::Unavailable {
                    source: name,
                    reason: err.to_string(),
                },
            )
        }
    }
}
