use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, params};
use tracing::{debug, warn};

use crate::config::app_cache_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FullTimeResult {
    Home,
    Draw,
    Away,
    Unknown,
}

impl FullTimeResult {
    pub fn from_code(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "H" => FullTimeResult::Home,
            "D" => FullTimeResult::Draw,
            "A" => FullTimeResult::Away,
            _ => FullTimeResult::Unknown,
        }
    }

    pub fn code(self) -> Option<&'static str> {
        match self {
            FullTimeResult::Home => Some("H"),
            FullTimeResult::Draw => Some("D"),
            FullTimeResult::Away => Some("A"),
            FullTimeResult::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamOutcome {
    Win,
    Draw,
    Loss,
}

impl TeamOutcome {
    pub fn letter(self) -> char {
        match self {
            TeamOutcome::Win => 'W',
            TeamOutcome::Draw => 'D',
            TeamOutcome::Loss => 'L',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub date: NaiveDate,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub ft_home_goals: Option<u8>,
    pub ft_away_goals: Option<u8>,
    pub ht_home_goals: Option<u8>,
    pub ht_away_goals: Option<u8>,
    pub result: FullTimeResult,
}

impl Match {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    pub fn is_home(&self, team: &str) -> bool {
        self.home_team == team
    }

    // Missing goal counts read as zero so the match keeps its slot in the series.
    pub fn goals_for(&self, team: &str) -> u8 {
        if self.is_home(team) {
            self.ft_home_goals.unwrap_or(0)
        } else {
            self.ft_away_goals.unwrap_or(0)
        }
    }

    pub fn goals_against(&self, team: &str) -> u8 {
        if self.is_home(team) {
            self.ft_away_goals.unwrap_or(0)
        } else {
            self.ft_home_goals.unwrap_or(0)
        }
    }

    pub fn ft_total(&self) -> u16 {
        u16::from(self.ft_home_goals.unwrap_or(0)) + u16::from(self.ft_away_goals.unwrap_or(0))
    }

    pub fn ht_total(&self) -> u16 {
        u16::from(self.ht_home_goals.unwrap_or(0)) + u16::from(self.ht_away_goals.unwrap_or(0))
    }

    pub fn has_half_time(&self) -> bool {
        self.ht_home_goals.is_some() || self.ht_away_goals.is_some()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn outcome_for(&self, team: &str) -> Option<TeamOutcome> {
        let home = self.is_home(team);
        match self.result {
            FullTimeResult::Draw => Some(TeamOutcome::Draw),
            FullTimeResult::Home if home => Some(TeamOutcome::Win),
            FullTimeResult::Away if !home => Some(TeamOutcome::Win),
            FullTimeResult::Home | FullTimeResult::Away => Some(TeamOutcome::Loss),
            FullTimeResult::Unknown => None,
        }
    }
}

/// All matches handed over by ingestion, kept in ingestion order.
#[derive(Debug, Clone, Default)]
pub struct MatchTable {
    matches: Vec<Match>,
}

impl MatchTable {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn teams_by_league(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for m in &self.matches {
            let teams = out.entry(m.league.clone()).or_default();
            for name in [&m.home_team, &m.away_team] {
                if !name.trim().is_empty() {
                    teams.insert(name.clone());
                }
            }
        }
        out
    }

    pub fn has_half_time_data(&self, league: &str) -> bool {
        self.matches
            .iter()
            .any(|m| m.league == league && m.has_half_time())
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.matches.iter().map(|m| m.date).max()
    }

    /// Matches of `team` within `league`, ascending by date. Same-day matches keep
    /// ingestion order.
    pub fn team_series<'a>(&'a self, league: &str, team: &str) -> TeamSeries<'a> {
        let mut matches: Vec<&Match> = self
            .matches
            .iter()
            .filter(|m| m.league == league && m.involves(team))
            .collect();
        matches.sort_by_key(|m| m.date);
        TeamSeries {
            team: team.to_string(),
            matches,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamSeries<'a> {
    pub team: String,
    matches: Vec<&'a Match>,
}

impl<'a> TeamSeries<'a> {
    pub fn matches(&self) -> &[&'a Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&'a Match> {
        self.matches.get(idx).copied()
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("matches.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY AUTOINCREMENT,
            league TEXT NOT NULL,
            match_date TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            ft_home_goals INTEGER NULL,
            ft_away_goals INTEGER NULL,
            ht_home_goals INTEGER NULL,
            ht_away_goals INTEGER NULL,
            ft_result TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(match_date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn insert_matches(conn: &mut Connection, matches: &[Match]) -> Result<usize> {
    let tx = conn.transaction().context("begin insert transaction")?;
    for m in matches {
        tx.execute(
            "INSERT INTO matches(league, match_date, home_team, away_team,
                ft_home_goals, ft_away_goals, ht_home_goals, ht_away_goals, ft_result)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                m.league,
                m.date.format("%Y-%m-%d").to_string(),
                m.home_team,
                m.away_team,
                m.ft_home_goals,
                m.ft_away_goals,
                m.ht_home_goals,
                m.ht_away_goals,
                m.result.code(),
            ],
        )
        .context("insert match")?;
    }
    tx.commit().context("commit insert transaction")?;
    Ok(matches.len())
}

/// Loads the match table, restricted to `leagues` unless that list is empty.
pub fn load_match_table(conn: &Connection, leagues: &[String]) -> Result<MatchTable> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT league, match_date, home_team, away_team,
                   ft_home_goals, ft_away_goals, ht_home_goals, ht_away_goals, ft_result
            FROM matches
            ORDER BY match_date ASC, match_id ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RawMatchRow {
                league: row.get(0)?,
                match_date: row.get(1)?,
                home_team: row.get(2)?,
                away_team: row.get(3)?,
                ft_home_goals: row.get(4)?,
                ft_away_goals: row.get(5)?,
                ht_home_goals: row.get(6)?,
                ht_away_goals: row.get(7)?,
                ft_result: row.get(8)?,
            })
        })
        .context("query matches")?;

    let mut matches = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        let row = row.context("read match row")?;
        if !leagues.is_empty() && !leagues.iter().any(|l| *l == row.league) {
            continue;
        }
        match row.into_match() {
            Some(m) => matches.push(m),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "dropped match rows without a usable date or team names");
    }
    debug!(loaded = matches.len(), "match table loaded");
    Ok(MatchTable::new(matches))
}

struct RawMatchRow {
    league: String,
    match_date: String,
    home_team: String,
    away_team: String,
    ft_home_goals: Option<i64>,
    ft_away_goals: Option<i64>,
    ht_home_goals: Option<i64>,
    ht_away_goals: Option<i64>,
    ft_result: Option<String>,
}

impl RawMatchRow {
    fn into_match(self) -> Option<Match> {
        let date = parse_match_date(&self.match_date)?;
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            return None;
        }
        let ft_home_goals = goals(self.ft_home_goals);
        let ft_away_goals = goals(self.ft_away_goals);
        let result = match self.ft_result.as_deref() {
            Some(code) => FullTimeResult::from_code(code),
            None => FullTimeResult::Unknown,
        };
        Some(Match {
            date,
            league: self.league,
            home_team: self.home_team,
            away_team: self.away_team,
            ft_home_goals,
            ft_away_goals,
            ht_home_goals: goals(self.ht_home_goals),
            ht_away_goals: goals(self.ht_away_goals),
            result,
        })
    }
}

fn goals(raw: Option<i64>) -> Option<u8> {
    raw.and_then(|v| u8::try_from(v).ok())
}

/// Accepts ISO dates as stored by `insert_matches`, plus the day-first formats found in
/// raw result files.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    None
}
