mod common;

use streak_alerts::alerts::{AlertTier, collect_alerts};
use streak_alerts::conditions::{Condition, ConditionSet};
use streak_alerts::config::LeagueCatalog;
use streak_alerts::fixtures::QuoteLookup;
use streak_alerts::records::compute_reports;

use common::{home_run, table};

#[test]
fn tiers_track_distance_to_record() {
    assert_eq!(AlertTier::classify(10, 10), AlertTier::Red);
    assert_eq!(AlertTier::classify(10, 9), AlertTier::Orange);
    assert_eq!(AlertTier::classify(10, 8), AlertTier::Green);
    assert_eq!(AlertTier::classify(10, 7), AlertTier::None);
}

#[test]
fn classification_is_total_over_valid_pairs() {
    for record in 0..=40u32 {
        for current in 1..=record {
            let tier = AlertTier::classify(record, current);
            let gap = record - current;
            let expected = match gap {
                0 => AlertTier::Red,
                1 => AlertTier::Orange,
                2 => AlertTier::Green,
                _ => AlertTier::None,
            };
            assert_eq!(tier, expected, "record={record} current={current}");
        }
    }
}

#[test]
fn alerts_are_sorted_red_first_and_carry_feed_state() {
    // Arsenal: three straight over-2.5 games, record 3 -> Red.
    // Chelsea: record 3 in the past, current 2 -> Orange.
    let mut matches = home_run("E0", "Arsenal", 2024, &[(0, 0), (3, 1), (2, 2), (4, 0)]);
    matches.extend(home_run(
        "E0",
        "Chelsea",
        2023,
        &[(3, 0), (2, 1), (1, 2), (0, 0), (3, 3), (2, 1)],
    ));
    let table = table(matches);
    let conditions = ConditionSet::new([Condition::FtOver25]);
    let reports = compute_reports(
        &table,
        &LeagueCatalog::reference(),
        &conditions,
        &["E0".to_string()],
        2,
    );

    let alerts = collect_alerts(&reports);
    let arsenal = alerts
        .iter()
        .position(|a| a.team == "Arsenal")
        .expect("arsenal alert");
    let chelsea = alerts
        .iter()
        .position(|a| a.team == "Chelsea")
        .expect("chelsea alert");
    assert!(arsenal < chelsea);
    assert_eq!(alerts[arsenal].tier, AlertTier::Red);
    assert_eq!(alerts[arsenal].league_name, "Premier League");
    assert_eq!(alerts[arsenal].record_year, Some(2024));
    assert_eq!(alerts[chelsea].tier, AlertTier::Orange);
    // No feed attached yet.
    assert_eq!(alerts[arsenal].quote, QuoteLookup::FeedUnavailable);
    assert!(alerts.iter().all(|a| a.tier != AlertTier::None));
}
