use crate::conditions::Condition;
use crate::fixtures::QuoteLookup;
use crate::records::TeamReport;

/// How close a current streak is to its record. Ordered, `Red` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertTier {
    None,
    Green,
    Orange,
    Red,
}

impl AlertTier {
    /// Red when the current streak equals the record, Orange one short, Green two short.
    /// A zero current streak never alerts.
    pub fn classify(record_length: u32, current_length: u32) -> Self {
        if current_length == 0 {
            return AlertTier::None;
        }
        match record_length.checked_sub(current_length) {
            Some(0) => AlertTier::Red,
            Some(1) => AlertTier::Orange,
            Some(2) => AlertTier::Green,
            _ => AlertTier::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertTier::None => "none",
            AlertTier::Green => "green",
            AlertTier::Orange => "orange",
            AlertTier::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub league: String,
    pub league_name: String,
    pub team: String,
    pub condition: Condition,
    pub tier: AlertTier,
    pub record_length: u32,
    pub record_year: Option<i32>,
    pub current_length: u32,
    pub last_five_ft_goals: String,
    pub next_match: String,
    pub quote: QuoteLookup,
}

/// Every non-`None` tier across `reports`, Red first, then league, team, condition.
pub fn collect_alerts(reports: &[TeamReport]) -> Vec<Alert> {
    let mut out = Vec::new();
    for report in reports {
        for (condition, stat) in &report.stats {
            let Some(stat) = stat.run_stat() else {
                continue;
            };
            let tier = stat.alert_tier();
            if tier == AlertTier::None {
                continue;
            }
            out.push(Alert {
                league: report.league.clone(),
                league_name: report.league_name.clone(),
                team: report.team.clone(),
                condition: *condition,
                tier,
                record_length: stat.record_length,
                record_year: stat.record_year,
                current_length: stat.current_length,
                last_five_ft_goals: report.last_five_ft_goals.clone(),
                next_match: report.fixture.describe(),
                quote: report.fixture.quote_for(*condition),
            });
        }
    }
    out.sort_by(|a, b| {
        b.tier
            .cmp(&a.tier)
            .then_with(|| a.league.cmp(&b.league))
            .then_with(|| a.team.cmp(&b.team))
            .then_with(|| a.condition.cmp(&b.condition))
    });
    out
}
