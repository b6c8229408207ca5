use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::app_cache_dir;
use crate::error::SnapshotError;
use crate::records::{RunStat, TeamReport};

const SNAPSHOT_FILE: &str = "streak_snapshot.json";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub written_at: Option<String>,
    pub rows: Vec<SnapshotRow>,
}

/// One (league, team) line. Conditions are keyed by their label; conditions that were
/// unavailable for the team are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub league: String,
    #[serde(default)]
    pub league_name: String,
    pub team: String,
    #[serde(default)]
    pub conditions: BTreeMap<String, RunStat>,
}

impl SnapshotRow {
    pub fn current_length(&self, label: &str) -> Option<u32> {
        self.conditions.get(label).map(|s| s.current_length)
    }
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            written_at: None,
            rows: Vec::new(),
        }
    }

    pub fn from_reports(reports: &[TeamReport]) -> Self {
        let mut rows: Vec<SnapshotRow> = reports
            .iter()
            .map(|report| SnapshotRow {
                league: report.league.clone(),
                league_name: report.league_name.clone(),
                team: report.team.clone(),
                conditions: report
                    .stats
                    .iter()
                    .filter_map(|(c, stat)| stat.run_stat().map(|s| (c.label().to_string(), *s)))
                    .collect(),
            })
            .collect();
        rows.sort_by(|a, b| a.league.cmp(&b.league).then_with(|| a.team.cmp(&b.team)));
        Self {
            version: SNAPSHOT_VERSION,
            written_at: Some(Utc::now().to_rfc3339()),
            rows,
        }
    }

    pub fn row(&self, league: &str, team: &str) -> Option<&SnapshotRow> {
        self.rows
            .iter()
            .find(|r| r.league == league && r.team == team)
    }

    /// Rows keyed by (league, team). A duplicated key keeps its first row.
    pub fn index(&self) -> BTreeMap<(&str, &str), &SnapshotRow> {
        let mut out = BTreeMap::new();
        for row in &self.rows {
            out.entry((row.league.as_str(), row.team.as_str()))
                .or_insert(row);
        }
        out
    }
}

/// What was found on disk before this batch.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorSnapshot {
    Missing,
    Loaded(Snapshot),
    Corrupt { reason: String },
}

impl PriorSnapshot {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, PriorSnapshot::Corrupt { .. })
    }
}

pub fn default_snapshot_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(SNAPSHOT_FILE))
}

/// `Ok(None)` when there is no file at `path`.
pub fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SnapshotError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::Version {
            path: path.to_path_buf(),
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    Ok(Some(snapshot))
}

pub fn load_prior(path: &Path) -> PriorSnapshot {
    match read_snapshot(path) {
        Ok(Some(snapshot)) => {
            debug!(rows = snapshot.rows.len(), path = %path.display(), "prior snapshot loaded");
            PriorSnapshot::Loaded(snapshot)
        }
        Ok(None) => PriorSnapshot::Missing,
        Err(err) => {
            warn!(error = %err, "prior snapshot unusable");
            PriorSnapshot::Corrupt {
                reason: err.to_string(),
            }
        }
    }
}

/// Writes next to `path` first, then renames over it, so readers see either the old or
/// the new file.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| SnapshotError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| SnapshotError::Write {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Moves an unusable snapshot aside so the next write does not destroy it.
pub fn quarantine(path: &Path) -> Result<PathBuf, SnapshotError> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| SNAPSHOT_FILE.to_string());
    let target = path.with_file_name(format!("{name}.corrupt-{stamp}"));
    fs::rename(path, &target).map_err(|source| SnapshotError::Write {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}
