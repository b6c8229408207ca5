use crate::match_data::{FullTimeResult, Match, TeamSeries};

/// Statistical conditions tracked per team. Goal lines are half-goal thresholds, so
/// "over 2.5" means at least three goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Condition {
    FtScored,
    FtCleanSheet,
    FtConceded,
    FtUnder05,
    FtOver15,
    FtUnder15,
    FtOver25,
    FtUnder25,
    FtOver35,
    FtUnder35,
    FtDraw,
    HtOver05,
    HtUnder05,
    HtOver15,
    HtUnder15,
}

pub const ALL_CONDITIONS: [Condition; 15] = [
    Condition::FtScored,
    Condition::FtCleanSheet,
    Condition::FtConceded,
    Condition::FtUnder05,
    Condition::FtOver15,
    Condition::FtUnder15,
    Condition::FtOver25,
    Condition::FtUnder25,
    Condition::FtOver35,
    Condition::FtUnder35,
    Condition::FtDraw,
    Condition::HtOver05,
    Condition::HtUnder05,
    Condition::HtOver15,
    Condition::HtUnder15,
];

impl Condition {
    pub fn label(self) -> &'static str {
        match self {
            Condition::FtScored => "FT Scored",
            Condition::FtCleanSheet => "FT Clean Sheet",
            Condition::FtConceded => "FT Conceded",
            Condition::FtUnder05 => "FT -0.5",
            Condition::FtOver15 => "FT +1.5",
            Condition::FtUnder15 => "FT -1.5",
            Condition::FtOver25 => "FT +2.5",
            Condition::FtUnder25 => "FT -2.5",
            Condition::FtOver35 => "FT +3.5",
            Condition::FtUnder35 => "FT -3.5",
            Condition::FtDraw => "FT Draw",
            Condition::HtOver05 => "HT +0.5",
            Condition::HtUnder05 => "HT -0.5",
            Condition::HtOver15 => "HT +1.5",
            Condition::HtUnder15 => "HT -1.5",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        ALL_CONDITIONS
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
    }

    pub fn needs_half_time(self) -> bool {
        matches!(
            self,
            Condition::HtOver05 | Condition::HtUnder05 | Condition::HtOver15 | Condition::HtUnder15
        )
    }

    /// Whether the condition held for `team` in `m`. Reads only this match.
    pub fn holds(self, m: &Match, team: &str) -> bool {
        let ft = m.ft_total();
        let ht = m.ht_total();
        match self {
            Condition::FtScored => m.goals_for(team) > 0,
            Condition::FtCleanSheet => m.goals_against(team) == 0,
            Condition::FtConceded => m.goals_against(team) > 0,
            Condition::FtUnder05 => under(ft, 5),
            Condition::FtOver15 => over(ft, 15),
            Condition::FtUnder15 => under(ft, 15),
            Condition::FtOver25 => over(ft, 25),
            Condition::FtUnder25 => under(ft, 25),
            Condition::FtOver35 => over(ft, 35),
            Condition::FtUnder35 => under(ft, 35),
            Condition::FtDraw => m.result == FullTimeResult::Draw,
            Condition::HtOver05 => over(ht, 5),
            Condition::HtUnder05 => under(ht, 5),
            Condition::HtOver15 => over(ht, 15),
            Condition::HtUnder15 => under(ht, 15),
        }
    }
}

// Lines are in tenths of a goal.
fn over(goals: u16, line_x10: u16) -> bool {
    goals * 10 > line_x10
}

fn under(goals: u16, line_x10: u16) -> bool {
    goals * 10 < line_x10
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl Default for ConditionSet {
    fn default() -> Self {
        Self::all()
    }
}

impl ConditionSet {
    pub fn all() -> Self {
        Self {
            conditions: ALL_CONDITIONS.to_vec(),
        }
    }

    pub fn new(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut out: Vec<Condition> = Vec::new();
        for c in conditions {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        Self { conditions: out }
    }

    /// Parses a comma separated list of labels; unknown labels are returned in `Err`.
    pub fn from_labels(raw: &str) -> Result<Self, Vec<String>> {
        let mut conditions = Vec::new();
        let mut unknown = Vec::new();
        for part in raw.split([',', ';']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match Condition::from_label(part) {
                Some(c) => conditions.push(c),
                None => unknown.push(part.to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(unknown);
        }
        Ok(Self::new(conditions))
    }

    pub fn iter(&self) -> impl Iterator<Item = Condition> + '_ {
        self.conditions.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn contains(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }
}

/// One boolean per match of the series, same order.
pub fn evaluate(series: &TeamSeries<'_>, condition: Condition) -> Vec<bool> {
    series
        .matches()
        .iter()
        .map(|m| condition.holds(m, &series.team))
        .collect()
}
