/// A maximal block of equal values inside a boolean series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub value: bool,
    pub start: usize,
    pub len: usize,
}

impl Run {
    pub fn end(&self) -> usize {
        self.start + self.len - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakSummary {
    pub record_length: u32,
    /// Index of the last element of the longest `true` run (latest one on ties).
    pub record_end: Option<usize>,
    pub current_length: u32,
}

/// Run-length encodes `series` in order, single pass.
pub fn runs(series: &[bool]) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::new();
    for (idx, &value) in series.iter().enumerate() {
        match out.last_mut() {
            Some(run) if run.value == value => run.len += 1,
            _ => out.push(Run {
                value,
                start: idx,
                len: 1,
            }),
        }
    }
    out
}

pub fn summarize(series: &[bool]) -> StreakSummary {
    let encoded = runs(series);

    let mut best: Option<Run> = None;
    for run in encoded.iter().filter(|r| r.value) {
        // `>=` so a later run of equal length takes over.
        if best.is_none_or(|b| run.len >= b.len) {
            best = Some(*run);
        }
    }

    let current_length = match encoded.last() {
        Some(run) if run.value => to_u32(run.len),
        _ => 0,
    };

    StreakSummary {
        record_length: best.map(|r| to_u32(r.len)).unwrap_or(0),
        record_end: best.map(|r| r.end()),
        current_length,
    }
}

fn to_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_alternate_values() {
        let encoded = runs(&[true, true, false, true]);
        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded[0].end(), 1);
        assert_eq!(encoded[2].start, 3);
        assert!(runs(&[]).is_empty());
    }

    #[test]
    fn all_false_has_no_record() {
        let s = summarize(&[false, false]);
        assert_eq!(s, StreakSummary::default());
    }
}
