use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::env_bool;
use crate::error::FeedError;
use crate::http_client::http_client;

const ODDS_API_BASE: &str = "https://api.the-odds-api.com/v4/sports";
const DEFAULT_BOOKMAKER: &str = "bet365";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Priced outcome of an upcoming fixture. Goal lines are in tenths (25 = 2.5 goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Market {
    HomeWin,
    Draw,
    AwayWin,
    HomeOrAway,
    Over(u16),
    Under(u16),
    BttsYes,
    BttsNo,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::HomeWin => f.write_str("1"),
            Market::Draw => f.write_str("X"),
            Market::AwayWin => f.write_str("2"),
            Market::HomeOrAway => f.write_str("12"),
            Market::Over(line) => write!(f, "Over {}.{}", line / 10, line % 10),
            Market::Under(line) => write!(f, "Under {}.{}", line / 10, line % 10),
            Market::BttsYes => f.write_str("BTTS Yes"),
            Market::BttsNo => f.write_str("BTTS No"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn label(self) -> &'static str {
        match self {
            Venue::Home => "Home",
            Venue::Away => "Away",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub opponent: String,
    pub venue: Venue,
    pub kickoff: Option<DateTime<Utc>>,
    pub quotes: BTreeMap<Market, f64>,
}

/// Upcoming fixtures keyed by the feed's own team spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteFeed {
    entries: BTreeMap<String, FeedEntry>,
}

impl QuoteFeed {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, team: &str) -> Option<&FeedEntry> {
        self.entries.get(team)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Registers both sides of an event. A team already holding an earlier kickoff keeps it.
    pub fn insert_event(
        &mut self,
        home: &str,
        away: &str,
        kickoff: Option<DateTime<Utc>>,
        quotes: BTreeMap<Market, f64>,
    ) {
        let sides = [
            (home, away, Venue::Home),
            (away, home, Venue::Away),
        ];
        for (team, opponent, venue) in sides {
            let incoming = FeedEntry {
                opponent: opponent.to_string(),
                venue,
                kickoff,
                quotes: quotes.clone(),
            };
            match self.entries.get(team) {
                Some(existing) if !is_earlier(incoming.kickoff, existing.kickoff) => {}
                _ => {
                    self.entries.insert(team.to_string(), incoming);
                }
            }
        }
    }

    pub fn merge(&mut self, other: QuoteFeed) {
        for (team, entry) in other.entries {
            match self.entries.get(&team) {
                Some(existing) if !is_earlier(entry.kickoff, existing.kickoff) => {}
                _ => {
                    self.entries.insert(team, entry);
                }
            }
        }
    }
}

fn is_earlier(candidate: Option<DateTime<Utc>>, existing: Option<DateTime<Utc>>) -> bool {
    match (candidate, existing) {
        (Some(c), Some(e)) => c < e,
        (Some(_), None) => true,
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct OddsFeedConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub regions: String,
    pub bookmaker: String,
    pub feed_file: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for OddsFeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            regions: "eu".to_string(),
            bookmaker: DEFAULT_BOOKMAKER.to_string(),
            feed_file: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OddsFeedConfig {
    pub fn from_env() -> Self {
        let enabled = env_bool("ODDS_ENABLED", true);
        let api_key = env::var("ODDS_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let regions = env::var("ODDS_REGIONS")
            .unwrap_or_else(|_| "eu".to_string())
            .trim()
            .to_ascii_lowercase();
        let bookmaker = env::var("ODDS_BOOKMAKER")
            .unwrap_or_else(|_| DEFAULT_BOOKMAKER.to_string())
            .trim()
            .to_ascii_lowercase();
        let feed_file = env::var("ODDS_FEED_FILE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let timeout_secs = env::var("ODDS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(2, 120);

        Self {
            enabled,
            api_key,
            regions,
            bookmaker,
            feed_file,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Where a batch gets its upcoming fixtures and prices from. Called once per batch.
pub trait QuoteSource {
    fn name(&self) -> &str;

    fn fetch(&self, sport_keys: &[String]) -> Result<QuoteFeed, FeedError>;
}

pub fn source_from_config(cfg: &OddsFeedConfig) -> Box<dyn QuoteSource> {
    if !cfg.enabled {
        return Box::new(DisabledSource);
    }
    if let Some(path) = cfg.feed_file.as_ref() {
        return Box::new(JsonFileSource {
            path: path.clone(),
            bookmaker: cfg.bookmaker.clone(),
        });
    }
    Box::new(TheOddsApiSource { cfg: cfg.clone() })
}

pub struct DisabledSource;

impl QuoteSource for DisabledSource {
    fn name(&self) -> &str {
        "disabled"
    }

    fn fetch(&self, _sport_keys: &[String]) -> Result<QuoteFeed, FeedError> {
        Err(FeedError::Disabled)
    }
}

/// A saved odds response on disk, same shape as the live API body.
pub struct JsonFileSource {
    pub path: PathBuf,
    pub bookmaker: String,
}

impl QuoteSource for JsonFileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, _sport_keys: &[String]) -> Result<QuoteFeed, FeedError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| FeedError::File {
            path: self.path.clone(),
            source,
        })?;
        parse_odds_events_json(&raw, &self.bookmaker)
    }
}

/// A feed already in memory.
pub struct StaticSource {
    pub feed: QuoteFeed,
}

impl QuoteSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, _sport_keys: &[String]) -> Result<QuoteFeed, FeedError> {
        Ok(self.feed.clone())
    }
}

pub struct TheOddsApiSource {
    cfg: OddsFeedConfig,
}

impl TheOddsApiSource {
    pub fn new(cfg: OddsFeedConfig) -> Self {
        Self { cfg }
    }
}

impl QuoteSource for TheOddsApiSource {
    fn name(&self) -> &str {
        "theoddsapi"
    }

    fn fetch(&self, sport_keys: &[String]) -> Result<QuoteFeed, FeedError> {
        let Some(api_key) = self.cfg.api_key.as_ref() else {
            return Err(FeedError::MissingApiKey);
        };
        if sport_keys.is_empty() {
            return Err(FeedError::NoSportKeys);
        }
        let client =
            http_client(self.cfg.timeout).map_err(|err| FeedError::Client(format!("{err:#}")))?;

        let mut feed = QuoteFeed::default();
        let mut last_err: Option<FeedError> = None;
        let mut succeeded = 0usize;
        for sport_key in sport_keys {
            match fetch_sport(client, sport_key, api_key, &self.cfg) {
                Ok(part) => {
                    debug!(sport_key = %sport_key, teams = part.len(), "odds sport fetched");
                    feed.merge(part);
                    succeeded += 1;
                }
                Err(err) => {
                    warn!(sport_key = %sport_key, error = %err, "odds sport fetch failed");
                    last_err = Some(err);
                }
            }
        }
        if succeeded == 0 {
            if let Some(err) = last_err {
                return Err(err);
            }
        }
        info!(
            sports = succeeded,
            teams = feed.len(),
            "odds feed loaded from the-odds-api"
        );
        Ok(feed)
    }
}

fn fetch_sport(
    client: &reqwest::blocking::Client,
    sport_key: &str,
    api_key: &str,
    cfg: &OddsFeedConfig,
) -> Result<QuoteFeed, FeedError> {
    let url = format!("{ODDS_API_BASE}/{sport_key}/odds");
    let resp = client
        .get(&url)
        .query(&[
            ("apiKey", api_key),
            ("regions", cfg.regions.as_str()),
            ("markets", "h2h,totals"),
            ("oddsFormat", "decimal"),
            ("dateFormat", "iso"),
        ])
        .header(USER_AGENT, concat!("streak_alerts/", env!("CARGO_PKG_VERSION")))
        .send()?;
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        let snippet = body
            .trim()
            .replace(['\n', '\r'], " ")
            .chars()
            .take(220)
            .collect::<String>();
        return Err(FeedError::Status {
            status: status.as_u16(),
            snippet,
        });
    }
    parse_odds_events_json(&body, &cfg.bookmaker)
}

#[derive(Debug, Deserialize)]
struct OddsEvent {
    commence_time: Option<String>,
    home_team: Option<String>,
    away_team: Option<String>,
    #[serde(default)]
    bookmakers: Vec<OddsBookmaker>,
}

#[derive(Debug, Deserialize)]
struct OddsBookmaker {
    #[serde(default)]
    key: String,
    #[serde(default)]
    markets: Vec<OddsMarket>,
}

#[derive(Debug, Deserialize)]
struct OddsMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Deserialize)]
struct OddsOutcome {
    name: String,
    price: f64,
    #[serde(default)]
    point: Option<f64>,
}

/// Parses an odds API body (array of events). Prices come from `preferred_bookmaker` when
/// present, otherwise from the first bookmaker listed.
pub fn parse_odds_events_json(raw: &str, preferred_bookmaker: &str) -> Result<QuoteFeed, FeedError> {
    let trimmed = raw.trim();
    let mut feed = QuoteFeed::default();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(feed);
    }
    let events: Vec<OddsEvent> = serde_json::from_str(trimmed)?;
    for event in &events {
        let (Some(home), Some(away)) = (event.home_team.as_deref(), event.away_team.as_deref())
        else {
            continue;
        };
        if home.trim().is_empty() || away.trim().is_empty() {
            continue;
        }
        let bookmaker = event
            .bookmakers
            .iter()
            .find(|b| b.key.eq_ignore_ascii_case(preferred_bookmaker))
            .or_else(|| event.bookmakers.first());
        let quotes = bookmaker
            .map(|b| extract_quotes(&b.markets, home, away))
            .unwrap_or_default();
        let kickoff = event.commence_time.as_deref().and_then(parse_kickoff);
        feed.insert_event(home, away, kickoff, quotes);
    }
    Ok(feed)
}

fn extract_quotes(markets: &[OddsMarket], home: &str, away: &str) -> BTreeMap<Market, f64> {
    let mut out = BTreeMap::new();
    for market in markets {
        let key = market.key.to_ascii_lowercase();
        for outcome in &market.outcomes {
            if outcome.price <= 1.0 {
                continue;
            }
            let name = outcome.name.trim();
            let priced = match key.as_str() {
                "h2h" => {
                    if name == home {
                        Some(Market::HomeWin)
                    } else if name == away {
                        Some(Market::AwayWin)
                    } else {
                        Some(Market::Draw)
                    }
                }
                "totals" => {
                    let Some(line) = outcome.point.and_then(goal_line) else {
                        continue;
                    };
                    if name.eq_ignore_ascii_case("over") {
                        Some(Market::Over(line))
                    } else if name.eq_ignore_ascii_case("under") {
                        Some(Market::Under(line))
                    } else {
                        None
                    }
                }
                "btts" => {
                    if name.eq_ignore_ascii_case("yes") {
                        Some(Market::BttsYes)
                    } else if name.eq_ignore_ascii_case("no") {
                        Some(Market::BttsNo)
                    } else {
                        None
                    }
                }
                _ => None,
            };
            if let Some(m) = priced {
                out.insert(m, outcome.price);
            }
        }
    }
    if let (Some(h), Some(a)) = (out.get(&Market::HomeWin), out.get(&Market::AwayWin)) {
        if let Some(price) = double_chance(*h, *a) {
            out.insert(Market::HomeOrAway, price);
        }
    }
    out
}

// Combined price for "either side wins", rounded to two decimals.
fn double_chance(home: f64, away: f64) -> Option<f64> {
    if home <= 1.0 || away <= 1.0 {
        return None;
    }
    let combined = 1.0 / (1.0 / home + 1.0 / away);
    Some((combined * 100.0).round() / 100.0)
}

fn goal_line(point: f64) -> Option<u16> {
    if !point.is_finite() || point < 0.0 || point > 20.0 {
        return None;
    }
    Some((point * 10.0).round() as u16)
}

fn parse_kickoff(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_chance_combines_both_sides() {
        assert_eq!(double_chance(2.0, 2.0), Some(1.0));
        assert_eq!(double_chance(1.0, 3.0), None);
    }

    #[test]
    fn market_labels_show_goal_lines() {
        assert_eq!(Market::Under(25).to_string(), "Under 2.5");
        assert_eq!(Market::Over(5).to_string(), "Over 0.5");
    }

    #[test]
    fn earliest_kickoff_wins_for_a_team() {
        let early = parse_kickoff("2025-01-10T15:00:00Z");
        let late = parse_kickoff("2025-01-17T15:00:00Z");
        let mut feed = QuoteFeed::default();
        feed.insert_event("Arsenal", "Chelsea", late, BTreeMap::new());
        feed.insert_event("Fulham", "Arsenal", early, BTreeMap::new());
        let entry = feed.get("Arsenal").expect("arsenal entry");
        assert_eq!(entry.opponent, "Fulham");
        assert_eq!(entry.venue, Venue::Away);
        assert_eq!(feed.get("Chelsea").map(|e| e.venue), Some(Venue::Away));
    }

    #[test]
    fn null_body_is_empty_feed() {
        let feed = parse_odds_events_json("null", "bet365").expect("null should parse");
        assert!(feed.is_empty());
    }
}
