use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use streak_alerts::alerts::AlertTier;
use streak_alerts::config::EngineConfig;
use streak_alerts::conditions::Condition;
use streak_alerts::diff::DiffStatus;
use streak_alerts::match_data;
use streak_alerts::odds_feed::source_from_config;
use streak_alerts::pipeline::{FeedStatus, run_batch};
use streak_alerts::report_export;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = parse_path_arg("db") {
        config.db_path = path;
    }
    if let Some(path) = parse_path_arg("snapshot") {
        config.snapshot_path = path;
    }
    if let Some(path) = parse_path_arg("export") {
        config.export_path = Some(path);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let conn = match_data::open_db(&config.db_path)?;
    let table = match_data::load_match_table(&conn, &config.leagues)
        .with_context(|| format!("load matches from {}", config.db_path.display()))?;
    if table.is_empty() {
        tracing::warn!(db = %config.db_path.display(), "match table is empty");
    }

    let source = source_from_config(&config.odds);
    let outcome = run_batch(&config, &table, source.as_ref())?;

    println!("Streak batch complete");
    println!("DB: {}", config.db_path.display());
    println!(
        "Matches: {} (latest {})",
        table.len(),
        table
            .latest_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!("Teams: {}", outcome.reports.len());
    match &outcome.feed_status {
        FeedStatus::Loaded { source, entries } => {
            println!("Quote feed: {source} ({entries} teams)")
        }
        FeedStatus::Unavailable { source, reason } => {
            println!("Quote feed: {source} unavailable ({reason})")
        }
    }

    for tier in [AlertTier::Red, AlertTier::Orange, AlertTier::Green] {
        let count = outcome.alerts.iter().filter(|a| a.tier == tier).count();
        println!("{} alerts: {count}", tier.label());
    }
    for alert in outcome.alerts.iter().take(20) {
        println!(
            "  [{}] {} {} {} current={} record={} ({}) next={} quote={}",
            alert.tier.label(),
            alert.league_name,
            alert.team,
            alert.condition.label(),
            alert.current_length,
            alert.record_length,
            alert
                .record_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            alert.next_match,
            alert.quote.describe()
        );
    }

    match &outcome.diff.status {
        DiffStatus::Compared => println!(
            "Streaks: {} broken, {} still active",
            outcome.diff.broken_count(),
            outcome.diff.active_count()
        ),
        DiffStatus::NoPriorState => println!("Streaks: no prior snapshot"),
        DiffStatus::PriorCorrupt(reason) => println!("Streaks: prior snapshot corrupt ({reason})"),
    }
    for entry in outcome.diff.broken.iter().take(20) {
        println!(
            "  broken {} {} {} after {}",
            entry.league_name,
            entry.team,
            entry.condition.label(),
            entry.previous_length
        );
    }
    if let Some(moved) = outcome.quarantined.as_ref() {
        println!("Corrupt snapshot kept at {}", moved.display());
    }
    println!("Snapshot: {}", outcome.snapshot_path.display());

    if let Some(path) = config.export_path.as_ref() {
        let conditions: Vec<Condition> = config.conditions.iter().collect();
        let summary = report_export::export_workbook(
            path,
            &conditions,
            &outcome.reports,
            &outcome.alerts,
            &outcome.diff,
        )?;
        println!(
            "Export: {} ({} teams, {} alerts, {} broken)",
            path.display(),
            summary.report_rows,
            summary.alert_rows,
            summary.broken_rows
        );
    }

    Ok(())
}

/// `--name=value` or `--name value`.
fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
