use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alerts::AlertTier;
use crate::conditions::{Condition, ConditionSet, evaluate};
use crate::config::LeagueCatalog;
use crate::fixtures::FixtureLookup;
use crate::match_data::{MatchTable, TeamOutcome, TeamSeries};
use crate::streak::summarize;

const FORM_WINDOW: usize = 5;
const FORM_WEIGHTS: [f64; FORM_WINDOW] = [0.2, 0.4, 0.6, 0.8, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStat {
    pub record_length: u32,
    /// `None` when there is no record (no `true` in the series).
    pub record_year: Option<i32>,
    pub current_length: u32,
    pub hit_rate_pct: f64,
}

impl RunStat {
    pub fn alert_tier(&self) -> AlertTier {
        AlertTier::classify(self.record_length, self.current_length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionStat {
    Available(RunStat),
    /// Half-time conditions in a league whose data carries no half-time score.
    Unavailable,
}

impl ConditionStat {
    pub fn run_stat(&self) -> Option<&RunStat> {
        match self {
            ConditionStat::Available(stat) => Some(stat),
            ConditionStat::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormScore {
    pub score: f64,
    /// Most recent first, e.g. "W, D, L, W, W".
    pub last_five: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamReport {
    pub league: String,
    pub league_name: String,
    pub team: String,
    pub matches_played: usize,
    pub stats: BTreeMap<Condition, ConditionStat>,
    pub form: Option<FormScore>,
    pub last_five_ft_goals: String,
    pub last_five_ht_goals: Option<String>,
    pub fixture: FixtureLookup,
}

impl TeamReport {
    pub fn run_stat(&self, condition: Condition) -> Option<&RunStat> {
        self.stats.get(&condition).and_then(ConditionStat::run_stat)
    }
}

pub fn compute_run_stat(series: &TeamSeries<'_>, condition: Condition) -> RunStat {
    let flags = evaluate(series, condition);
    let summary = summarize(&flags);
    let record_year = summary
        .record_end
        .and_then(|idx| series.get(idx))
        .map(|m| m.year());
    let hits = flags.iter().filter(|f| **f).count();
    let hit_rate_pct = if flags.is_empty() {
        0.0
    } else {
        hits as f64 / flags.len() as f64 * 100.0
    };
    RunStat {
        record_length: summary.record_length,
        record_year,
        current_length: summary.current_length,
        hit_rate_pct,
    }
}

/// Weighted score over the last five matches with a known result, oldest weighted least.
pub fn form_score(series: &TeamSeries<'_>) -> Option<FormScore> {
    let team = series.team.as_str();
    let known: Vec<_> = series
        .matches()
        .iter()
        .filter_map(|m| m.outcome_for(team).map(|o| (*m, o)))
        .collect();
    if known.len() < FORM_WINDOW {
        return None;
    }
    let recent = &known[known.len() - FORM_WINDOW..];

    let mut score = 0.0;
    let mut letters = Vec::with_capacity(FORM_WINDOW);
    for ((m, outcome), weight) in recent.iter().zip(FORM_WEIGHTS) {
        let mut points: f64 = match outcome {
            TeamOutcome::Win => 5.0,
            TeamOutcome::Draw => 1.0,
            TeamOutcome::Loss => -3.0,
        };
        if m.goals_for(team) >= 3 {
            points += 2.0;
        }
        if m.goals_against(team) == 0 {
            points += 2.0;
        }
        score += points * weight;
        letters.push(outcome.letter().to_string());
    }
    letters.reverse();
    Some(FormScore {
        score,
        last_five: letters.join(", "),
    })
}

fn last_five_goals(series: &TeamSeries<'_>, half_time: bool) -> String {
    let matches = series.matches();
    let start = matches.len().saturating_sub(FORM_WINDOW);
    matches[start..]
        .iter()
        .map(|m| {
            if half_time {
                m.ht_total().to_string()
            } else {
                m.ft_total().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn compute_team_report(
    table: &MatchTable,
    catalog: &LeagueCatalog,
    conditions: &ConditionSet,
    league: &str,
    team: &str,
    half_time_available: bool,
) -> TeamReport {
    let series = table.team_series(league, team);
    let mut stats = BTreeMap::new();
    for condition in conditions.iter() {
        let stat = if condition.needs_half_time() && !half_time_available {
            ConditionStat::Unavailable
        } else {
            ConditionStat::Available(compute_run_stat(&series, condition))
        };
        stats.insert(condition, stat);
    }
    TeamReport {
        league: league.to_string(),
        league_name: catalog.display_name(league).to_string(),
        team: team.to_string(),
        matches_played: series.len(),
        stats,
        form: form_score(&series),
        last_five_ft_goals: last_five_goals(&series, false),
        last_five_ht_goals: half_time_available.then(|| last_five_goals(&series, true)),
        fixture: FixtureLookup::FeedUnavailable,
    }
}

/// Every (league, team) of the table, sorted by league then team. `leagues` restricts the
/// leagues when non-empty.
pub fn compute_reports(
    table: &MatchTable,
    catalog: &LeagueCatalog,
    conditions: &ConditionSet,
    leagues: &[String],
    parallelism: usize,
) -> Vec<TeamReport> {
    let mut units: Vec<(String, String, bool)> = Vec::new();
    for (league, teams) in table.teams_by_league() {
        if !leagues.is_empty() && !leagues.contains(&league) {
            continue;
        }
        let half_time = table.has_half_time_data(&league);
        if !half_time {
            debug!(league = %league, "no half-time data, half-time conditions unavailable");
        }
        for team in teams {
            units.push((league.clone(), team, half_time));
        }
    }

    let pool = build_compute_pool(parallelism);
    let mut reports: Vec<TeamReport> = with_compute_pool(&pool, || {
        units
            .par_iter()
            .map(|(league, team, half_time)| {
                compute_team_report(table, catalog, conditions, league, team, *half_time)
            })
            .collect()
    });
    reports.sort_by(|a, b| a.league.cmp(&b.league).then_with(|| a.team.cmp(&b.team)));
    info!(teams = reports.len(), "team reports computed");
    reports
}

fn build_compute_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(1, 32))
        .build()
        .ok()
}

fn with_compute_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::match_data::{FullTimeResult, Match};

    fn game(day: u32, home: &str, away: &str, ft: (u8, u8), ht: Option<(u8, u8)>) -> Match {
        let result = if ft.0 > ft.1 {
            FullTimeResult::Home
        } else if ft.0 < ft.1 {
            FullTimeResult::Away
        } else {
            FullTimeResult::Draw
        };
        Match {
            date: NaiveDate::from_ymd_opt(2024, 9, day).expect("valid date"),
            league: "E0".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            ft_home_goals: Some(ft.0),
            ft_away_goals: Some(ft.1),
            ht_home_goals: ht.map(|h| h.0),
            ht_away_goals: ht.map(|h| h.1),
            result,
        }
    }

    fn arsenal_form() -> Vec<Match> {
        vec![
            game(1, "Arsenal", "Leeds", (3, 0), Some((1, 0))),
            game(8, "Arsenal", "Hull", (1, 1), Some((0, 1))),
            game(15, "Arsenal", "Wigan", (0, 2), Some((0, 0))),
            game(22, "Fulham", "Arsenal", (0, 1), Some((0, 1))),
            game(29, "Arsenal", "Stoke", (4, 1), Some((2, 1))),
        ]
    }

    #[test]
    fn form_weights_recent_results_and_bonuses() {
        let table = MatchTable::new(arsenal_form());
        let form = form_score(&table.team_series("E0", "Arsenal")).expect("five results");
        // 9*0.2 + 1*0.4 - 3*0.6 + 7*0.8 + 7*1.0
        assert!((form.score - 13.0).abs() < 1e-9, "score {}", form.score);
        assert_eq!(form.last_five, "W, W, L, D, W");
    }

    #[test]
    fn unknown_results_are_skipped_by_form() {
        let mut matches = arsenal_form();
        let mut abandoned = game(20, "Arsenal", "Burnley", (0, 0), None);
        abandoned.ft_home_goals = None;
        abandoned.ft_away_goals = None;
        abandoned.result = FullTimeResult::Unknown;
        matches.push(abandoned);
        let table = MatchTable::new(matches);
        let form = form_score(&table.team_series("E0", "Arsenal")).expect("five results");
        assert!((form.score - 13.0).abs() < 1e-9);
        assert_eq!(form.last_five, "W, W, L, D, W");
    }

    #[test]
    fn fewer_than_five_known_results_has_no_form() {
        let mut matches = arsenal_form();
        matches[0].result = FullTimeResult::Unknown;
        let table = MatchTable::new(matches);
        assert_eq!(form_score(&table.team_series("E0", "Arsenal")), None);
    }

    #[test]
    fn last_five_goal_strings_are_oldest_first() {
        let mut matches = vec![game(1, "Spurs", "Arsenal", (5, 5), Some((3, 3)))];
        for (idx, m) in arsenal_form().into_iter().enumerate() {
            matches.push(Match {
                date: NaiveDate::from_ymd_opt(2024, 10, idx as u32 + 1).expect("valid date"),
                ..m
            });
        }
        let table = MatchTable::new(matches);
        let report = compute_team_report(
            &table,
            &LeagueCatalog::reference(),
            &ConditionSet::all(),
            "E0",
            "Arsenal",
            true,
        );
        assert_eq!(report.matches_played, 6);
        assert_eq!(report.last_five_ft_goals, "3, 2, 2, 1, 5");
        assert_eq!(report.last_five_ht_goals.as_deref(), Some("1, 1, 0, 1, 3"));
        assert_eq!(report.league_name, "Premier League");
        assert_eq!(report.fixture, FixtureLookup::FeedUnavailable);
    }

    #[test]
    fn short_series_lists_what_it_has() {
        let table = MatchTable::new(vec![game(1, "Leeds", "Hull", (2, 0), None)]);
        let report = compute_team_report(
            &table,
            &LeagueCatalog::reference(),
            &ConditionSet::all(),
            "E0",
            "Hull",
            false,
        );
        assert_eq!(report.last_five_ft_goals, "2");
        assert_eq!(report.last_five_ht_goals, None);
        assert_eq!(report.form, None);
        assert_eq!(
            report.stats.get(&Condition::HtOver05),
            Some(&ConditionStat::Unavailable)
        );
    }
}
