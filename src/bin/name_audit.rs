use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use streak_alerts::config::EngineConfig;
use streak_alerts::match_data;
use streak_alerts::name_match::MatcherChain;
use streak_alerts::odds_feed::source_from_config;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = parse_db_path_arg() {
        config.db_path = path;
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
    let teams_by_league = table.teams_by_league();
    if teams_by_league.is_empty() {
        return Err(anyhow!("no teams in {}", config.db_path.display()));
    }

    let sport_keys = config
        .catalog
        .feed_sport_keys(teams_by_league.keys().map(String::as_str));
    let source = source_from_config(&config.odds);
    let feed = source
        .fetch(&sport_keys)
        .with_context(|| format!("quote feed ({}) unavailable", source.name()))?;
    let matchers = MatcherChain::standard();

    println!("Team name audit");
    println!("DB: {}", config.db_path.display());
    println!("Feed: {} ({} teams)", source.name(), feed.len());

    let mut unresolved = 0usize;
    for (league, teams) in &teams_by_league {
        println!(
            "{} ({league}): {} teams",
            config.catalog.display_name(league),
            teams.len()
        );
        for team in teams {
            match matchers.resolve(team, feed.keys()) {
                Some(hit) => println!("  {team} -> {} [{}]", hit.feed_key, hit.rule),
                None => {
                    unresolved += 1;
                    println!("  {team} -> no fixture");
                }
            }
        }
    }
    println!("Unresolved: {unresolved}");

    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
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
