//! Scored checklists
//!
//! A [`Report`] is an ordered list of [`CheckResult`] rows plus a score derived
//! from them: `floor(100 * pass / total)`. Only `Pass` rows count; `Warning`
//! and `Fail` are never partial credit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warning => "warning",
            CheckStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub score: u8,
    pub checks: Vec<CheckResult>,
    /// Set when the checklist is a generic stand-in for a failed fetch.
    #[serde(default)]
    pub heuristic: bool,
}

impl Report {
    pub fn pass_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count()
    }
}

/// `floor(100 * pass / total)`, or 0 for an empty checklist.
pub fn score(pass_count: usize, total_checks: usize) -> u8 {
    if total_checks == 0 {
        return 0;
    }
    let pass_count = pass_count.min(total_checks);
    ((pass_count * 100) / total_checks) as u8
}

#[derive(Debug, Default)]
pub struct ReportBuilder {
    checks: Vec<CheckResult>,
    heuristic: bool,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heuristic(mut self, heuristic: bool) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn push(
        &mut self,
        name: impl Into<String>,
        status: CheckStatus,
        message: impl Into<String>,
    ) -> &mut Self {
        self.checks.push(CheckResult {
            name: name.into(),
            status,
            message: message.into(),
        });
        self
    }

    pub fn pass(&mut self, name: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.push(name, CheckStatus::Pass, message)
    }

    pub fn warn(&mut self, name: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.push(name, CheckStatus::Warning, message)
    }

    pub fn fail(&mut self, name: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.push(name, CheckStatus::Fail, message)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn build(self) -> Report {
        let pass_count = self
            .checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count();
        Report {
            score: score(pass_count, self.checks.len()),
            checks: self.checks,
            heuristic: self.heuristic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_floors() {
        assert_eq!(score(1, 3), 33);
        assert_eq!(score(2, 3), 66);
        assert_eq!(score(2, 10), 20);
        assert_eq!(score(1, 7), 14);
    }

    #[test]
    fn test_score_bounds() {
        for total in 1..=50 {
            for pass in 0..=total {
                let s = score(pass, total);
                assert!(s <= 100);
            }
            assert_eq!(score(0, total), 0);
            assert_eq!(score(total, total), 100);
        }
    }

    #[test]
    fn test_score_is_monotonic_in_pass_count() {
        for total in 1..=40 {
            let mut previous = 0;
            for pass in 0..=total {
                let s = score(pass, total);
                assert!(s >= previous);
                previous = s;
            }
        }
    }

    #[test]
    fn test_empty_checklist_scores_zero() {
        assert_eq!(score(0, 0), 0);
        assert_eq!(ReportBuilder::new().build().score, 0);
    }

    #[test]
    fn test_only_pass_counts() {
        let mut builder = ReportBuilder::new();
        builder
            .pass("SSL Certificate", "HTTPS is enabled")
            .warn("Meta Title", "Verify title")
            .fail("H1 Tag", "Missing");
        let report = builder.build();
        assert_eq!(report.score, 33);
        assert_eq!(report.pass_count(), 1);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut builder = ReportBuilder::new();
        builder.warn("b", "").pass("a", "").fail("c", "");
        let names: Vec<_> = builder.build().checks.into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
