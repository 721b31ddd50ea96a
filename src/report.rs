//! Violation reporting.
//!
//! The [`Report`] is the sole externally visible artifact of a scan. It is
//! constructed once per invocation, immutable afterwards, and carries no state
//! across scans. Construction applies, in order: diff-range filtering,
//! deduplication, a deterministic sort, and the pass/fail verdict.

use crate::diff::DiffIndex;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Severity level for violations, ordered `Info < Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational hint - style suggestion, not a problem.
    Info,
    /// Warning - potential issue that should be reviewed.
    Warning,
    /// Error - definite problem.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Warning
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(Error::InvalidThreshold {
                value: s.to_string(),
            }),
        }
    }
}

/// One reported instance of a rule's finding against a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Id of the rule that produced this violation.
    pub rule_id: String,
    /// Path of the candidate file.
    pub path: PathBuf,
    /// 1-indexed source line.
    pub line: usize,
    /// 1-indexed source column, when known.
    pub column: Option<usize>,
    /// Human-readable description.
    pub message: String,
    /// Effective severity at report time.
    pub severity: Severity,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {} - {}",
            self.path.display(),
            self.line,
            self.rule_id,
            self.severity,
            self.message
        )
    }
}

/// A candidate that was excluded from rule execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    /// Path of the skipped file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Violation counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// Number of info-level violations.
    pub info: usize,
    /// Number of warning-level violations.
    pub warning: usize,
    /// Number of error-level violations.
    pub error: usize,
}

impl SeverityCounts {
    /// Total number of violations.
    pub fn total(&self) -> usize {
        self.info + self.warning + self.error
    }
}

/// Final, ordered result of a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Violations, sorted by `(path, line, rule_id)`.
    pub violations: Vec<Violation>,
    /// Candidates excluded from rule execution, sorted by path.
    pub skipped: Vec<Skipped>,
    /// Violation counts by severity.
    pub counts: SeverityCounts,
    /// Whether the scan failed against the severity threshold.
    pub failed: bool,
}

impl Report {
    /// Build a report from raw engine output.
    ///
    /// Steps, in order: drop violations outside the diff range (when one is
    /// active), deduplicate exact `(rule_id, path, line, message)` tuples,
    /// sort ascending by `(path, line, rule_id)`, and compute the verdict
    /// against `threshold`. The result is identical for identical inputs
    /// regardless of the order violations were produced in.
    pub fn build(
        mut raw: Vec<Violation>,
        mut skipped: Vec<Skipped>,
        diff: Option<&DiffIndex>,
        threshold: Severity,
    ) -> Self {
        if let Some(index) = diff {
            raw.retain(|v| index.contains(&v.path, v.line));
        }

        raw.sort_by(|a, b| {
            (&a.path, a.line, &a.rule_id, &a.message, a.column)
                .cmp(&(&b.path, b.line, &b.rule_id, &b.message, b.column))
        });
        raw.dedup_by(|a, b| {
            a.rule_id == b.rule_id && a.path == b.path && a.line == b.line && a.message == b.message
        });

        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let mut counts = SeverityCounts::default();
        for violation in &raw {
            match violation.severity {
                Severity::Info => counts.info += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Error => counts.error += 1,
            }
        }

        let failed = raw.iter().any(|v| v.severity >= threshold);

        Self {
            violations: raw,
            skipped,
            counts,
            failed,
        }
    }

    /// Whether the report contains no violations at all.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// One-line summary of the scan outcome.
    pub fn summary(&self) -> String {
        format!(
            "{} violation(s): {} error(s), {} warning(s), {} info; {} skipped",
            self.counts.total(),
            self.counts.error,
            self.counts.warning,
            self.counts.info,
            self.skipped.len()
        )
    }
}
