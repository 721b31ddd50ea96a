//! Scan orchestration.
//!
//! [`Scanner`] wires the pieces together: it reads every input file up front,
//! parses and classifies it, freezes the registry and diff index, hands the
//! candidate list to the engine for parallel evaluation, and assembles the
//! final [`Report`]. Fatal errors (configuration, diff parsing) surface
//! before the first candidate is evaluated; everything else becomes
//! report-visible data.

use crate::candidate::{classify, Candidate, CandidateKind, KindOverrides};
use crate::config::RuleSelection;
use crate::diff::DiffIndex;
use crate::engine;
use crate::error::{Error, Result};
use crate::parser::{parse_document, Node};
use crate::registry::RuleRegistry;
use crate::report::{Report, Severity, Skipped};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configures and runs scans against a frozen rule registry.
pub struct Scanner {
    registry: RuleRegistry,
    overrides: KindOverrides,
    diff: Option<DiffIndex>,
    threshold: Severity,
    strict: bool,
}

impl Scanner {
    /// Create a scanner around a configured registry.
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            overrides: KindOverrides::new(),
            diff: None,
            threshold: Severity::Warning,
            strict: false,
        }
    }

    /// A scanner with the builtin rule catalog.
    pub fn with_builtin_rules() -> Result<Self> {
        Ok(Self::new(RuleRegistry::with_builtin_rules()?))
    }

    /// Apply a rule selection to the underlying registry.
    pub fn with_selection(mut self, selection: &RuleSelection) -> Result<Self> {
        selection.apply(&mut self.registry)?;
        Ok(self)
    }

    /// Force a candidate kind for a specific path.
    pub fn with_kind_override(mut self, path: impl Into<PathBuf>, kind: CandidateKind) -> Self {
        self.overrides.insert(path.into(), kind);
        self
    }

    /// Restrict reported violations to lines touched by a unified diff.
    ///
    /// Malformed diff input is fatal; filtering cannot be trusted on broken
    /// input.
    pub fn with_diff(mut self, diff_text: &str) -> Result<Self> {
        self.diff = Some(DiffIndex::parse(diff_text)?);
        Ok(self)
    }

    /// Set the severity at or above which the scan fails (default: warning).
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    /// Treat unclassifiable candidates as fatal instead of skipping them.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Scan a set of files and produce the report.
    ///
    /// Files are read once, up front; evaluation then runs purely on
    /// in-memory parsed content. Scanning identical inputs yields an
    /// identical report regardless of scheduling.
    pub fn scan<P: AsRef<Path>>(&self, paths: impl IntoIterator<Item = P>) -> Result<Report> {
        let mut candidates = Vec::new();
        let mut skipped = Vec::new();

        for path in paths {
            let path = path.as_ref();
            match self.load_candidate(path)? {
                Loaded::Candidate(candidate) => candidates.push(candidate),
                Loaded::Skipped(record) => {
                    warn!(path = %record.path.display(), reason = %record.reason, "skipping candidate");
                    skipped.push(record);
                }
            }
        }

        // Registry and diff index are frozen from here on; evaluation only
        // holds shared references.
        let raw = engine::evaluate(&candidates, &self.registry);
        Ok(Report::build(raw, skipped, self.diff.as_ref(), self.threshold))
    }

    fn load_candidate(&self, path: &Path) -> Result<Loaded> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                return Ok(Loaded::Skipped(Skipped {
                    path: path.to_path_buf(),
                    reason: format!("unreadable: {err}"),
                }));
            }
        };

        // Path heuristics first; content is only consulted when the path
        // alone is inconclusive.
        let by_path = classify(path, None, &self.overrides);
        let kind_and_content = match by_path {
            CandidateKind::Template | CandidateKind::Inventory => {
                // Not structured documents; rules see the raw text as a
                // single scalar node.
                Some((by_path, Node::scalar(text, 1, 1)))
            }
            _ => match parse_document(&text) {
                Ok(node) => {
                    let kind = if by_path == CandidateKind::Unknown {
                        classify(path, Some(&node), &self.overrides)
                    } else {
                        by_path
                    };
                    Some((kind, node))
                }
                Err(err) if by_path != CandidateKind::Unknown => {
                    return Ok(Loaded::Skipped(Skipped {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    }));
                }
                Err(_) => None,
            },
        };

        match kind_and_content {
            Some((CandidateKind::Unknown, _)) | None => {
                let reason = "unrecognized artifact type".to_string();
                if self.strict {
                    return Err(Error::Classification {
                        path: path.to_path_buf(),
                        reason,
                    });
                }
                Ok(Loaded::Skipped(Skipped {
                    path: path.to_path_buf(),
                    reason,
                }))
            }
            Some((kind, content)) => {
                debug!(path = %path.display(), kind = %kind, "classified candidate");
                Ok(Loaded::Candidate(Candidate::new(path, kind, content)))
            }
        }
    }
}

enum Loaded {
    Candidate(Candidate),
    Skipped(Skipped),
}

/// Scan a set of files with the builtin rule catalog.
///
/// This is the engine entry point consumed by the external CLI layer:
/// `selection` narrows and reconfigures the rules, `diff` (when supplied)
/// restricts findings to changed lines, and `threshold` sets the failure
/// verdict.
pub fn scan<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
    selection: &RuleSelection,
    diff: Option<&str>,
    threshold: Severity,
) -> Result<Report> {
    let mut scanner = Scanner::with_builtin_rules()?.with_selection(selection)?;
    if let Some(diff_text) = diff {
        scanner = scanner.with_diff(diff_text)?;
    }
    scanner.with_threshold(threshold).scan(paths)
}
