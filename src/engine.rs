//! Rule engine.
//!
//! Evaluates every applicable rule against every classified candidate.
//! Execution is isolated per (candidate, rule) pair: a check that returns an
//! error or panics yields exactly one synthetic [`RULE_FAILURE_ID`] violation
//! and evaluation continues, so a scan always completes and always reflects
//! every other rule's true findings.
//!
//! Candidates are evaluated in parallel. This is safe because the registry is
//! frozen (borrowed shared) for the duration of the scan, rules never
//! communicate, and the report applies a final deterministic sort, so the
//! output is identical regardless of worker scheduling.

use crate::candidate::{Candidate, CandidateKind};
use crate::registry::{ActiveRule, RuleRegistry};
use crate::report::{Severity, Violation};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Rule id reserved for synthetic violations emitted when a check fails.
pub const RULE_FAILURE_ID: &str = "engine.rule_failure";

/// Evaluate all candidates against the registry, in parallel.
///
/// `Unknown` candidates are excluded from rule execution. The returned
/// violations are raw engine output; ordering is only established by
/// [`crate::report::Report::build`].
pub fn evaluate(candidates: &[Candidate], registry: &RuleRegistry) -> Vec<Violation> {
    candidates
        .par_iter()
        .flat_map_iter(|candidate| evaluate_candidate(candidate, registry))
        .collect()
}

/// Evaluate a single candidate against every applicable enabled rule.
pub fn evaluate_candidate(candidate: &Candidate, registry: &RuleRegistry) -> Vec<Violation> {
    if candidate.kind == CandidateKind::Unknown {
        return Vec::new();
    }

    let rules = registry.rules_for(candidate.kind);
    debug!(
        path = %candidate.path.display(),
        kind = %candidate.kind,
        rules = rules.len(),
        "evaluating candidate"
    );

    let mut violations = Vec::new();
    for rule in rules {
        run_isolated(candidate, rule, &mut violations);
    }
    violations
}

/// Run one rule against one candidate, containing any failure.
fn run_isolated(candidate: &Candidate, rule: ActiveRule<'_>, violations: &mut Vec<Violation>) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(candidate)));

    match outcome {
        Ok(Ok(findings)) => {
            for finding in findings {
                violations.push(Violation {
                    rule_id: rule.id().to_string(),
                    path: candidate.path.clone(),
                    line: finding.line,
                    column: finding.column,
                    message: finding.message,
                    severity: rule.severity(),
                });
            }
        }
        Ok(Err(err)) => {
            warn!(
                rule = rule.id(),
                path = %candidate.path.display(),
                error = %err,
                "rule check failed; continuing"
            );
            violations.push(rule_failure(candidate, rule.id(), &err.0));
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(
                rule = rule.id(),
                path = %candidate.path.display(),
                error = %message,
                "rule check panicked; continuing"
            );
            violations.push(rule_failure(candidate, rule.id(), &message));
        }
    }
}

/// Synthetic violation recording a contained rule failure.
fn rule_failure(candidate: &Candidate, rule_id: &str, detail: &str) -> Violation {
    Violation {
        rule_id: RULE_FAILURE_ID.to_string(),
        path: candidate.path.clone(),
        line: 1,
        column: None,
        message: format!("rule '{rule_id}' failed: {detail}"),
        severity: Severity::Error,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}
