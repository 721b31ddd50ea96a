//! Play-level rules for playbooks.

use crate::candidate::{Candidate, CandidateKind};
use crate::error::RuleError;
use crate::parser::Node;
use crate::registry::{Finding, Rule};
use crate::report::Severity;

type CheckResult = std::result::Result<Vec<Finding>, RuleError>;

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new("require-play-name", Severity::Warning, require_play_name)
            .applies_to(CandidateKind::Playbook),
        Rule::new("require-hosts", Severity::Error, require_hosts)
            .applies_to(CandidateKind::Playbook),
    ]
}

fn plays(candidate: &Candidate) -> impl Iterator<Item = &Node> {
    candidate.content.items().iter().filter(|n| n.is_mapping())
}

fn require_play_name(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for play in plays(candidate) {
        match play.get("name").and_then(Node::as_str) {
            None => findings.push(
                Finding::new(play.line(), "Play has no name").with_column(play.column()),
            ),
            Some(name) if name.trim().is_empty() => {
                findings.push(Finding::new(play.line(), "Play has an empty name"));
            }
            Some(_) => {}
        }
    }
    Ok(findings)
}

fn require_hosts(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for play in plays(candidate) {
        if !play.contains_key("hosts") {
            findings.push(
                Finding::new(play.line(), "Play does not target any hosts")
                    .with_column(play.column()),
            );
        }
    }
    Ok(findings)
}
