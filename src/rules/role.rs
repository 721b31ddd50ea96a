//! Rules for role metadata and variable files.

use crate::candidate::{Candidate, CandidateKind};
use crate::error::RuleError;
use crate::registry::{Finding, Rule};
use crate::report::Severity;

type CheckResult = std::result::Result<Vec<Finding>, RuleError>;

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new("meta-requires-info", Severity::Error, meta_requires_info)
            .applies_to(CandidateKind::RoleMeta),
        Rule::new("no-empty-vars", Severity::Info, no_empty_vars)
            .applies_to(CandidateKind::RoleDefaults)
            .applies_to(CandidateKind::RoleVars),
    ]
}

fn meta_requires_info(candidate: &Candidate) -> CheckResult {
    let content = &candidate.content;
    if content.is_mapping() && content.contains_key("galaxy_info") {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::new(
        content.line(),
        "Role metadata does not declare 'galaxy_info'",
    )])
}

fn no_empty_vars(candidate: &Candidate) -> CheckResult {
    let content = &candidate.content;
    if content.is_mapping() && !content.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![Finding::new(
        content.line(),
        "Variables file is empty or not a mapping",
    )])
}
