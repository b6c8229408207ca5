use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::conditions::ConditionSet;
use crate::match_data::default_db_path;
use crate::odds_feed::OddsFeedConfig;
use crate::snapshot::default_snapshot_path;

const APP_DIR: &str = "streak_alerts";
const DEFAULT_PARALLELISM: usize = 4;

// code, display name, odds feed sport key
const REFERENCE_LEAGUES: &[(&str, &str, Option<&str>)] = &[
    ("E0", "Premier League", Some("soccer_epl")),
    ("E1", "Championship", Some("soccer_efl_champ")),
    ("D1", "Bundesliga", Some("soccer_germany_bundesliga")),
    ("D2", "Bundesliga 2", Some("soccer_germany_bundesliga2")),
    ("F1", "Ligue 1", Some("soccer_france_ligue_one")),
    ("F2", "Ligue 2", Some("soccer_france_ligue_two")),
    ("I1", "Serie A", Some("soccer_italy_serie_a")),
    ("I2", "Serie B", Some("soccer_italy_serie_b")),
    ("SP1", "La Liga", Some("soccer_spain_la_liga")),
    ("SP2", "La Liga 2", Some("soccer_spain_segunda_division")),
    ("N1", "Eredivisie", Some("soccer_netherlands_eredivisie")),
    ("P1", "Liga Portugal", Some("soccer_portugal_primeira_liga")),
    ("SC0", "Scottish Premiership", Some("soccer_spl")),
    ("B1", "Jupiler Pro League", Some("soccer_belgium_first_div")),
    ("T1", "Super Lig", Some("soccer_turkey_super_league")),
    ("G1", "Super League Greece", Some("soccer_greece_super_league")),
    ("ARG", "Argentina Primera", Some("soccer_argentina_primera_division")),
    ("AUT", "Austria Bundesliga", Some("soccer_austria_bundesliga")),
    ("BRA", "Brasileirao", Some("soccer_brazil_campeonato")),
    ("CHN", "Chinese Super League", Some("soccer_china_superleague")),
    ("DNK", "Danish Superliga", Some("soccer_denmark_superliga")),
    ("FIN", "Veikkausliiga", Some("soccer_finland_veikkausliiga")),
    ("IRL", "League of Ireland", Some("soccer_league_of_ireland")),
    ("JPN", "J League", Some("soccer_japan_j_league")),
    ("MEX", "Liga MX", Some("soccer_mexico_ligamx")),
    ("NOR", "Eliteserien", Some("soccer_norway_eliteserien")),
    ("POL", "Ekstraklasa", Some("soccer_poland_ekstraklasa")),
    ("ROU", "Liga I", None),
    ("RUS", "Russian Premier League", None),
    ("SWE", "Allsvenskan", Some("soccer_sweden_allsvenskan")),
    ("SWZ", "Swiss Super League", Some("soccer_switzerland_superleague")),
    ("USA", "MLS", Some("soccer_usa_mls")),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueInfo {
    pub name: String,
    pub feed_sport_key: Option<String>,
}

/// League code to display name and quote-feed sport key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueCatalog {
    leagues: BTreeMap<String, LeagueInfo>,
}

impl LeagueCatalog {
    pub fn reference() -> Self {
        let mut catalog = Self::default();
        for (code, name, sport_key) in REFERENCE_LEAGUES {
            catalog.insert(code, name, *sport_key);
        }
        catalog
    }

    pub fn insert(&mut self, code: &str, name: &str, feed_sport_key: Option<&str>) {
        self.leagues.insert(
            code.to_string(),
            LeagueInfo {
                name: name.to_string(),
                feed_sport_key: feed_sport_key.map(str::to_string),
            },
        );
    }

    /// Unknown codes display as themselves.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.leagues
            .get(code)
            .map(|l| l.name.as_str())
            .unwrap_or(code)
    }

    pub fn feed_sport_key(&self, code: &str) -> Option<&str> {
        self.leagues
            .get(code)
            .and_then(|l| l.feed_sport_key.as_deref())
    }

    /// Sorted, de-duplicated sport keys of `codes` that have one.
    pub fn feed_sport_keys<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut keys: Vec<String> = codes
            .into_iter()
            .filter_map(|code| self.feed_sport_key(code))
            .map(str::to_string)
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub export_path: Option<PathBuf>,
    /// Empty means every league found in the match table.
    pub leagues: Vec<String>,
    pub parallelism: usize,
    pub log_level: String,
    pub catalog: LeagueCatalog,
    pub conditions: ConditionSet,
    pub odds: OddsFeedConfig,
}

impl EngineConfig {
    /// Defaults for everything but the two paths; quote feed off.
    pub fn new(db_path: PathBuf, snapshot_path: PathBuf) -> Self {
        Self {
            db_path,
            snapshot_path,
            export_path: None,
            leagues: Vec::new(),
            parallelism: DEFAULT_PARALLELISM,
            log_level: "info".to_string(),
            catalog: LeagueCatalog::reference(),
            conditions: ConditionSet::all(),
            odds: OddsFeedConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let db_path = env_path("STREAK_DB_PATH")
            .or_else(default_db_path)
            .context("unable to resolve match db path (set STREAK_DB_PATH)")?;
        let snapshot_path = env_path("STREAK_SNAPSHOT_PATH")
            .or_else(default_snapshot_path)
            .context("unable to resolve snapshot path (set STREAK_SNAPSHOT_PATH)")?;

        let mut cfg = Self::new(db_path, snapshot_path);
        cfg.export_path = env_path("STREAK_EXPORT_PATH");
        cfg.leagues = env::var("STREAK_LEAGUES")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();
        cfg.parallelism = env::var("STREAK_PARALLELISM")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_PARALLELISM)
            .clamp(1, 32);
        cfg.log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        if let Ok(raw) = env::var("STREAK_CONDITIONS") {
            if !raw.trim().is_empty() {
                cfg.conditions = ConditionSet::from_labels(&raw)
                    .map_err(|unknown| anyhow!("unknown STREAK_CONDITIONS labels: {unknown:?}"))?;
            }
        }
        cfg.odds = OddsFeedConfig::from_env();
        Ok(cfg)
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn parse_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let part = part.trim();
        if !part.is_empty() && !out.iter().any(|p| p == part) {
            out.push(part.to_string());
        }
    }
    out
}
