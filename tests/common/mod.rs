#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use chrono::{Days, NaiveDate};

use streak_alerts::match_data::{FullTimeResult, Match, MatchTable};

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn day(year: i32, offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.checked_add_days(Days::new(offset)))
        .expect("valid test date")
}

pub fn game(
    league: &str,
    date: NaiveDate,
    home: &str,
    away: &str,
    ft: (u8, u8),
    ht: Option<(u8, u8)>,
) -> Match {
    let result = if ft.0 > ft.1 {
        FullTimeResult::Home
    } else if ft.0 < ft.1 {
        FullTimeResult::Away
    } else {
        FullTimeResult::Draw
    };
    Match {
        date,
        league: league.to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        ft_home_goals: Some(ft.0),
        ft_away_goals: Some(ft.1),
        ht_home_goals: ht.map(|h| h.0),
        ht_away_goals: ht.map(|h| h.1),
        result,
    }
}

/// `team` plays at home every week starting in `year`, one match per score.
pub fn home_run(league: &str, team: &str, year: i32, scores: &[(u8, u8)]) -> Vec<Match> {
    scores
        .iter()
        .enumerate()
        .map(|(idx, score)| {
            game(
                league,
                day(year, idx as u64 * 7),
                team,
                &format!("Opponent {idx}"),
                *score,
                Some((0, 0)),
            )
        })
        .collect()
}

pub fn table(matches: Vec<Match>) -> MatchTable {
    MatchTable::new(matches)
}
