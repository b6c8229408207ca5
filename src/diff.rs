//! Compares the current-streak lengths of this batch with the previous snapshot.
//!
//! Only the transition between the two snapshots is visible: a streak that broke and
//! restarted between two batches shows up as still active.

use crate::conditions::Condition;
use crate::snapshot::{PriorSnapshot, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenEntry {
    pub league: String,
    pub league_name: String,
    pub team: String,
    pub condition: Condition,
    pub previous_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    pub league: String,
    pub league_name: String,
    pub team: String,
    pub condition: Condition,
    pub previous_length: u32,
    pub current_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStatus {
    Compared,
    NoPriorState,
    PriorCorrupt(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakDiff {
    pub status: DiffStatus,
    pub broken: Vec<BrokenEntry>,
    pub active: Vec<ActiveEntry>,
}

impl StreakDiff {
    fn skipped(status: DiffStatus) -> Self {
        Self {
            status,
            broken: Vec::new(),
            active: Vec::new(),
        }
    }

    pub fn broken_count(&self) -> usize {
        self.broken.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

pub fn diff_snapshots(prior: &PriorSnapshot, current: &Snapshot) -> StreakDiff {
    match prior {
        PriorSnapshot::Missing => StreakDiff::skipped(DiffStatus::NoPriorState),
        PriorSnapshot::Corrupt { reason } => {
            StreakDiff::skipped(DiffStatus::PriorCorrupt(reason.clone()))
        }
        PriorSnapshot::Loaded(prior) => {
            let (broken, active) = compare(prior, current);
            StreakDiff {
                status: DiffStatus::Compared,
                broken,
                active,
            }
        }
    }
}

/// Broken: prior > 0 and now 0. Active: prior > 0 and now > 0. Teams missing from `prior`
/// and conditions not tracked in `current` are skipped.
pub fn compare(prior: &Snapshot, current: &Snapshot) -> (Vec<BrokenEntry>, Vec<ActiveEntry>) {
    let prior_rows = prior.index();
    let mut broken = Vec::new();
    let mut active = Vec::new();

    for (key, row) in current.index() {
        let Some(before) = prior_rows.get(&key) else {
            continue;
        };
        for (label, prior_stat) in &before.conditions {
            if prior_stat.current_length == 0 {
                continue;
            }
            let Some(condition) = Condition::from_label(label) else {
                continue;
            };
            let Some(now) = row.current_length(label) else {
                continue;
            };
            if now == 0 {
                broken.push(BrokenEntry {
                    league: row.league.clone(),
                    league_name: row.league_name.clone(),
                    team: row.team.clone(),
                    condition,
                    previous_length: prior_stat.current_length,
                });
            } else {
                active.push(ActiveEntry {
                    league: row.league.clone(),
                    league_name: row.league_name.clone(),
                    team: row.team.clone(),
                    condition,
                    previous_length: prior_stat.current_length,
                    current_length: now,
                });
            }
        }
    }

    broken.sort_by(|a, b| {
        a.league
            .cmp(&b.league)
            .then_with(|| a.team.cmp(&b.team))
            .then_with(|| b.previous_length.cmp(&a.previous_length))
            .then_with(|| a.condition.cmp(&b.condition))
    });
    active.sort_by(|a, b| {
        a.league
            .cmp(&b.league)
            .then_with(|| a.team.cmp(&b.team))
            .then_with(|| a.condition.cmp(&b.condition))
    });
    (broken, active)
}
