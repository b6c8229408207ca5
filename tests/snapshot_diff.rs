use std::collections::BTreeMap;
use std::fs;

use streak_alerts::conditions::Condition;
use streak_alerts::diff::{DiffStatus, diff_snapshots};
use streak_alerts::error::SnapshotError;
use streak_alerts::records::RunStat;
use streak_alerts::snapshot::{
    PriorSnapshot, SNAPSHOT_VERSION, Snapshot, SnapshotRow, load_prior, quarantine, read_snapshot,
    write_snapshot,
};

fn stat(current: u32) -> RunStat {
    RunStat {
        record_length: current.max(6),
        record_year: Some(2024),
        current_length: current,
        hit_rate_pct: 50.0,
    }
}

fn row(league: &str, team: &str, entries: &[(Condition, u32)]) -> SnapshotRow {
    let conditions: BTreeMap<String, RunStat> = entries
        .iter()
        .map(|(c, current)| (c.label().to_string(), stat(*current)))
        .collect();
    SnapshotRow {
        league: league.to_string(),
        league_name: String::new(),
        team: team.to_string(),
        conditions,
    }
}

fn snapshot(rows: Vec<SnapshotRow>) -> Snapshot {
    Snapshot {
        version: SNAPSHOT_VERSION,
        written_at: None,
        rows,
    }
}

#[test]
fn streak_falling_to_zero_is_broken_and_shrinking_is_active() {
    let prior = snapshot(vec![row(
        "E0",
        "Arsenal",
        &[(Condition::FtOver25, 5), (Condition::FtScored, 5)],
    )]);
    let current = snapshot(vec![row(
        "E0",
        "Arsenal",
        &[(Condition::FtOver25, 0), (Condition::FtScored, 2)],
    )]);

    let diff = diff_snapshots(&PriorSnapshot::Loaded(prior), &current);
    assert_eq!(diff.status, DiffStatus::Compared);
    assert_eq!(diff.broken_count(), 1);
    assert_eq!(diff.broken[0].condition, Condition::FtOver25);
    assert_eq!(diff.broken[0].previous_length, 5);
    assert_eq!(diff.active_count(), 1);
    assert_eq!(diff.active[0].condition, Condition::FtScored);
    assert_eq!(diff.active[0].current_length, 2);
}

#[test]
fn unchanged_table_reports_nothing_broken_twice() {
    let table = snapshot(vec![
        row("E0", "Arsenal", &[(Condition::FtOver25, 0)]),
        row("D1", "Bayern", &[(Condition::FtScored, 7)]),
    ]);
    let first = diff_snapshots(&PriorSnapshot::Loaded(table.clone()), &table);
    let second = diff_snapshots(&PriorSnapshot::Loaded(table.clone()), &table);
    assert_eq!(first.broken_count(), 0);
    assert_eq!(first, second);
    assert_eq!(first.active_count(), 1);
}

#[test]
fn new_teams_and_dropped_conditions_are_skipped() {
    let prior = snapshot(vec![row(
        "E0",
        "Arsenal",
        &[(Condition::HtOver05, 4), (Condition::FtDraw, 0)],
    )]);
    let current = snapshot(vec![
        row("E0", "Arsenal", &[(Condition::FtDraw, 1)]),
        row("E0", "Luton", &[(Condition::FtDraw, 0)]),
    ]);
    let diff = diff_snapshots(&PriorSnapshot::Loaded(prior), &current);
    assert!(diff.broken.is_empty());
    assert!(diff.active.is_empty());
}

#[test]
fn broken_list_orders_longest_previous_streak_first_per_team() {
    let prior = snapshot(vec![
        row("E0", "Arsenal", &[(Condition::FtOver15, 2), (Condition::FtScored, 9)]),
        row("D1", "Bayern", &[(Condition::FtOver15, 3)]),
    ]);
    let current = snapshot(vec![
        row("E0", "Arsenal", &[(Condition::FtOver15, 0), (Condition::FtScored, 0)]),
        row("D1", "Bayern", &[(Condition::FtOver15, 0)]),
    ]);
    let diff = diff_snapshots(&PriorSnapshot::Loaded(prior), &current);
    let order: Vec<(&str, u32)> = diff
        .broken
        .iter()
        .map(|b| (b.team.as_str(), b.previous_length))
        .collect();
    assert_eq!(order, vec![("Bayern", 3), ("Arsenal", 9), ("Arsenal", 2)]);
}

#[test]
fn missing_and_corrupt_prior_are_distinct() {
    let current = snapshot(vec![row("E0", "Arsenal", &[(Condition::FtOver25, 0)])]);
    let missing = diff_snapshots(&PriorSnapshot::Missing, &current);
    assert_eq!(missing.status, DiffStatus::NoPriorState);
    let corrupt = diff_snapshots(
        &PriorSnapshot::Corrupt {
            reason: "bad json".to_string(),
        },
        &current,
    );
    assert_eq!(corrupt.status, DiffStatus::PriorCorrupt("bad json".to_string()));
    assert_ne!(missing.status, corrupt.status);
    assert!(corrupt.broken.is_empty() && corrupt.active.is_empty());
}

#[test]
fn snapshot_file_round_trips_through_atomic_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("snapshot.json");
    assert_eq!(read_snapshot(&path).expect("absent is ok"), None);
    assert_eq!(load_prior(&path), PriorSnapshot::Missing);

    let table = snapshot(vec![row("E0", "Arsenal", &[(Condition::FtOver25, 3)])]);
    write_snapshot(&path, &table).expect("write");
    assert!(!path.with_extension("json.tmp").exists());
    assert_eq!(read_snapshot(&path).expect("read"), Some(table.clone()));
    assert_eq!(load_prior(&path), PriorSnapshot::Loaded(table));
}

#[test]
fn corrupt_file_is_reported_then_moved_aside() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.json");
    fs::write(&path, "{ not json").expect("write garbage");

    assert!(matches!(
        read_snapshot(&path),
        Err(SnapshotError::Parse { .. })
    ));
    assert!(load_prior(&path).is_corrupt());

    let moved = quarantine(&path).expect("quarantine");
    assert!(!path.exists());
    assert_eq!(fs::read_to_string(&moved).expect("kept"), "{ not json");
    assert!(
        moved
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("snapshot.json.corrupt-"))
    );
}

#[test]
fn other_version_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("snapshot.json");
    let mut table = snapshot(Vec::new());
    table.version = SNAPSHOT_VERSION + 1;
    write_snapshot(&path, &table).expect("write");
    assert!(matches!(
        read_snapshot(&path),
        Err(SnapshotError::Version { .. })
    ));
}
