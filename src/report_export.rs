use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::alerts::Alert;
use crate::conditions::Condition;
use crate::diff::StreakDiff;
use crate::records::{ConditionStat, TeamReport};

pub struct ExportSummary {
    pub report_rows: usize,
    pub alert_rows: usize,
    pub broken_rows: usize,
}

/// Writes the Report, Alerts and Broken sheets. `conditions` fixes the column order of
/// the Report sheet.
pub fn export_workbook(
    path: &Path,
    conditions: &[Condition],
    reports: &[TeamReport],
    alerts: &[Alert],
    diff: &StreakDiff,
) -> Result<ExportSummary> {
    let report_rows = report_rows(conditions, reports);
    let alert_rows = alert_rows(alerts);
    let broken_rows = broken_rows(diff);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Report")?;
        write_rows(sheet, &report_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Alerts")?;
        write_rows(sheet, &alert_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Broken")?;
        write_rows(sheet, &broken_rows)?;
    }
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create export dir {}", dir.display()))?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportSummary {
        report_rows: report_rows.len().saturating_sub(1),
        alert_rows: alert_rows.len().saturating_sub(1),
        broken_rows: broken_rows.len().saturating_sub(1),
    })
}

fn report_rows(conditions: &[Condition], reports: &[TeamReport]) -> Vec<Vec<String>> {
    let mut header = vec![
        "League".to_string(),
        "Team".to_string(),
        "Matches".to_string(),
        "Form".to_string(),
        "Form Score".to_string(),
        "Last 5 FT Goals".to_string(),
        "Next Match".to_string(),
    ];
    for condition in conditions {
        let label = condition.label();
        header.push(format!("{label} Record"));
        header.push(format!("{label} Year"));
        header.push(format!("{label} Current"));
        header.push(format!("{label} %"));
    }

    let mut rows = vec![header];
    for report in reports {
        let mut row = vec![
            report.league_name.clone(),
            report.team.clone(),
            report.matches_played.to_string(),
            report
                .form
                .as_ref()
                .map(|f| f.last_five.clone())
                .unwrap_or_default(),
            report
                .form
                .as_ref()
                .map(|f| format!("{:.1}", f.score))
                .unwrap_or_default(),
            report.last_five_ft_goals.clone(),
            report.fixture.describe(),
        ];
        for condition in conditions {
            match report.stats.get(condition) {
                Some(ConditionStat::Available(stat)) => {
                    row.push(stat.record_length.to_string());
                    row.push(year_text(stat.record_year));
                    row.push(stat.current_length.to_string());
                    row.push(format!("{:.1}", stat.hit_rate_pct));
                }
                Some(ConditionStat::Unavailable) | None => {
                    row.extend(std::iter::repeat_n("n/a".to_string(), 4));
                }
            }
        }
        rows.push(row);
    }
    rows
}

fn alert_rows(alerts: &[Alert]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Tier".to_string(),
        "League".to_string(),
        "Team".to_string(),
        "Condition".to_string(),
        "Record".to_string(),
        "Record Year".to_string(),
        "Current".to_string(),
        "Last 5 FT Goals".to_string(),
        "Next Match".to_string(),
        "Quote".to_string(),
    ]];
    for alert in alerts {
        rows.push(vec![
            alert.tier.label().to_string(),
            alert.league_name.clone(),
            alert.team.clone(),
            alert.condition.label().to_string(),
            alert.record_length.to_string(),
            year_text(alert.record_year),
            alert.current_length.to_string(),
            alert.last_five_ft_goals.clone(),
            alert.next_match.clone(),
            alert.quote.describe(),
        ]);
    }
    rows
}

fn broken_rows(diff: &StreakDiff) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "League".to_string(),
        "Team".to_string(),
        "Condition".to_string(),
        "Previous Streak".to_string(),
    ]];
    for entry in &diff.broken {
        rows.push(vec![
            entry.league_name.clone(),
            entry.team.clone(),
            entry.condition.label().to_string(),
            entry.previous_length.to_string(),
        ]);
    }
    rows
}

fn year_text(year: Option<i32>) -> String {
    year.map(|y| y.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{BrokenEntry, DiffStatus};

    #[test]
    fn broken_sheet_has_header_and_rows() {
        let diff = StreakDiff {
            status: DiffStatus::Compared,
            broken: vec![BrokenEntry {
                league: "E0".to_string(),
                league_name: "Premier League".to_string(),
                team: "Arsenal".to_string(),
                condition: Condition::FtOver25,
                previous_length: 4,
            }],
            active: Vec::new(),
        };
        let rows = broken_rows(&diff);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Premier League", "Arsenal", "FT +2.5", "4"]);
    }

    #[test]
    fn missing_record_year_reads_unknown() {
        assert_eq!(year_text(None), "unknown");
        assert_eq!(year_text(Some(2023)), "2023");
    }
}
