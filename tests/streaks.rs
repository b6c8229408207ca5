mod common;

use streak_alerts::conditions::{Condition, evaluate};
use streak_alerts::records::compute_run_stat;
use streak_alerts::streak::summarize;

use common::{day, game, home_run, table};

fn bits(mask: u32, len: usize) -> Vec<bool> {
    (0..len).map(|i| mask & (1 << i) != 0).collect()
}

fn brute_force_record(series: &[bool]) -> (u32, Option<usize>) {
    let mut best = 0u32;
    let mut best_end = None;
    for start in 0..series.len() {
        for end in start..series.len() {
            if series[start..=end].iter().all(|v| *v) {
                let len = (end - start + 1) as u32;
                if len > best || (len == best && best_end.is_some_and(|e| end > e)) {
                    best = len;
                    best_end = Some(end);
                }
            }
        }
    }
    (best, best_end)
}

fn brute_force_current(series: &[bool]) -> u32 {
    series.iter().rev().take_while(|v| **v).count() as u32
}

#[test]
fn summary_matches_brute_force_for_every_short_series() {
    for len in 0..=10usize {
        for mask in 0..(1u32 << len) {
            let series = bits(mask, len);
            let summary = summarize(&series);
            let (record, record_end) = brute_force_record(&series);
            assert_eq!(summary.record_length, record, "record for {series:?}");
            assert_eq!(summary.record_end, record_end, "record end for {series:?}");
            assert_eq!(
                summary.current_length,
                brute_force_current(&series),
                "current for {series:?}"
            );
        }
    }
}

#[test]
fn trailing_run_is_both_record_and_current() {
    let series = [true, true, false, true, true, true];
    let summary = summarize(&series);
    assert_eq!(summary.record_length, 3);
    assert_eq!(summary.current_length, 3);
    assert_eq!(summary.record_end, Some(5));
}

#[test]
fn false_last_match_clears_current() {
    let summary = summarize(&[true, true, true, false]);
    assert_eq!(summary.record_length, 3);
    assert_eq!(summary.current_length, 0);
}

#[test]
fn empty_series_has_no_record() {
    let summary = summarize(&[]);
    assert_eq!(summary.record_length, 0);
    assert_eq!(summary.record_end, None);
    assert_eq!(summary.current_length, 0);
}

#[test]
fn record_year_comes_from_the_trailing_run() {
    // Over 2.5 pattern T,T,F,T,T,T across two seasons; the sixth match is in 2024.
    let mut matches = home_run("E0", "Arsenal", 2023, &[(2, 1), (3, 0), (0, 0)]);
    matches.push(game("E0", day(2024, 3), "Arsenal", "Leeds", (2, 2), None));
    matches.push(game("E0", day(2024, 10), "Arsenal", "Hull", (4, 0), None));
    matches.push(game("E0", day(2024, 17), "Arsenal", "Wigan", (1, 3), None));
    let table = table(matches);
    let series = table.team_series("E0", "Arsenal");
    assert_eq!(
        evaluate(&series, Condition::FtOver25),
        vec![true, true, false, true, true, true]
    );

    let stat = compute_run_stat(&series, Condition::FtOver25);
    assert_eq!(stat.record_length, 3);
    assert_eq!(stat.current_length, 3);
    assert_eq!(stat.record_year, Some(2024));
    assert!((stat.hit_rate_pct - 500.0 / 6.0).abs() < 1e-9);
}

#[test]
fn tied_records_resolve_to_the_later_run_every_time() {
    // Two scoring runs of length 2: 2021 and 2022, broken by a 0-0.
    let matches = vec![
        game("D1", day(2021, 0), "Bayern", "A", (1, 0), None),
        game("D1", day(2021, 7), "Bayern", "B", (2, 0), None),
        game("D1", day(2021, 14), "Bayern", "C", (0, 0), None),
        game("D1", day(2022, 0), "Bayern", "D", (1, 1), None),
        game("D1", day(2022, 7), "Bayern", "E", (3, 1), None),
        game("D1", day(2022, 14), "Bayern", "F", (0, 2), None),
    ];
    let table = table(matches);
    for _ in 0..5 {
        let series = table.team_series("D1", "Bayern");
        let stat = compute_run_stat(&series, Condition::FtScored);
        assert_eq!(stat.record_length, 2);
        assert_eq!(stat.record_year, Some(2022));
        assert_eq!(stat.current_length, 0);
    }
}

#[test]
fn same_day_matches_keep_ingestion_order() {
    let matches = vec![
        game("I1", day(2023, 0), "Roma", "A", (0, 0), None),
        game("I1", day(2023, 0), "Roma", "B", (3, 0), None),
    ];
    let table = table(matches);
    let series = table.team_series("I1", "Roma");
    assert_eq!(
        evaluate(&series, Condition::FtOver25),
        vec![false, true]
    );
}

#[test]
fn team_without_any_hit_has_unknown_year() {
    let table = table(home_run("F1", "Lens", 2023, &[(0, 0), (1, 0)]));
    let series = table.team_series("F1", "Lens");
    let stat = compute_run_stat(&series, Condition::FtOver35);
    assert_eq!(stat.record_length, 0);
    assert_eq!(stat.record_year, None);
    assert_eq!(stat.current_length, 0);
}
