//! Rule catalog and configuration.
//!
//! Rules are registered into a [`RuleRegistry`] from an explicit table built
//! at startup; there is no runtime discovery and no ambient singleton, the
//! registry instance is passed to every call that needs it. Configuration
//! (disabling rules, overriding severities) requires `&mut self` and is
//! therefore only possible before a scan borrows the registry - the borrow is
//! the synchronization boundary that makes lock-free concurrent reads safe.

use crate::candidate::{Candidate, CandidateKind};
use crate::engine::RULE_FAILURE_ID;
use crate::error::{Error, Result, RuleError};
use crate::report::Severity;
use std::collections::{BTreeMap, BTreeSet};

/// A raw finding produced by a rule's check function.
///
/// The engine stamps the rule id, candidate path and effective severity onto
/// findings to form [`crate::report::Violation`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// 1-indexed source line.
    pub line: usize,
    /// 1-indexed source column, when known.
    pub column: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl Finding {
    /// Create a finding at a line.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

/// A rule's check function.
///
/// Checks are pure with respect to shared state: they read the candidate's
/// content tree and return findings, nothing else. Implemented for any
/// matching closure, and as a trait so rules that carry injected lookups can
/// hold state of their own.
pub trait Check: Send + Sync {
    /// Run the check against one candidate.
    fn run(&self, candidate: &Candidate) -> std::result::Result<Vec<Finding>, RuleError>;
}

impl<F> Check for F
where
    F: Fn(&Candidate) -> std::result::Result<Vec<Finding>, RuleError> + Send + Sync,
{
    fn run(&self, candidate: &Candidate) -> std::result::Result<Vec<Finding>, RuleError> {
        self(candidate)
    }
}

/// A named, independent check bound to one or more candidate kinds.
pub struct Rule {
    id: String,
    applicable: BTreeSet<CandidateKind>,
    severity: Severity,
    check: Box<dyn Check>,
}

impl Rule {
    /// Create a rule.
    pub fn new(id: impl Into<String>, severity: Severity, check: impl Check + 'static) -> Self {
        Self {
            id: id.into(),
            applicable: BTreeSet::new(),
            severity,
            check: Box::new(check),
        }
    }

    /// Declare a candidate kind this rule applies to.
    pub fn applies_to(mut self, kind: CandidateKind) -> Self {
        self.applicable.insert(kind);
        self
    }

    /// Declare the task-bearing kinds (playbook, role-tasks, role-handlers).
    pub fn applies_to_task_files(self) -> Self {
        self.applies_to(CandidateKind::Playbook)
            .applies_to(CandidateKind::RoleTasks)
            .applies_to(CandidateKind::RoleHandlers)
    }

    /// The rule id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The rule's default severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether this rule applies to the given candidate kind.
    pub fn applies(&self, kind: CandidateKind) -> bool {
        self.applicable.contains(&kind)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("applicable", &self.applicable)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Registered rule plus its effective configuration.
#[derive(Debug)]
struct RegisteredRule {
    rule: Rule,
    enabled: bool,
    effective_severity: Severity,
}

/// An enabled rule as handed to the engine for one candidate kind.
#[derive(Clone, Copy)]
pub struct ActiveRule<'a> {
    id: &'a str,
    severity: Severity,
    check: &'a dyn Check,
}

impl<'a> ActiveRule<'a> {
    /// The rule id.
    pub fn id(&self) -> &'a str {
        self.id
    }

    /// The effective severity after configuration overrides.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Run the rule's check against a candidate.
    pub fn check(&self, candidate: &Candidate) -> std::result::Result<Vec<Finding>, RuleError> {
        self.check.run(candidate)
    }
}

/// The catalog of rules for a scan.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    // BTreeMap keeps rules_for deterministic: ascending id order regardless
    // of registration order.
    rules: BTreeMap<String, RegisteredRule>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-loaded with the builtin rule catalog.
    pub fn with_builtin_rules() -> Result<Self> {
        let mut registry = Self::new();
        for rule in crate::rules::builtin_rules() {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Register a rule.
    ///
    /// Fails with [`Error::DuplicateRule`] if the id is already present; a
    /// duplicate is a configuration error, never a silent overwrite.
    pub fn register(&mut self, rule: Rule) -> Result<()> {
        if rule.id() == RULE_FAILURE_ID {
            return Err(Error::ReservedRuleId {
                id: rule.id().to_string(),
            });
        }
        if self.rules.contains_key(rule.id()) {
            return Err(Error::DuplicateRule {
                id: rule.id().to_string(),
            });
        }
        let severity = rule.severity();
        self.rules.insert(
            rule.id().to_string(),
            RegisteredRule {
                rule,
                enabled: true,
                effective_severity: severity,
            },
        );
        Ok(())
    }

    /// Disable a rule for the upcoming scan.
    pub fn disable(&mut self, id: &str) -> Result<()> {
        self.entry(id)?.enabled = false;
        Ok(())
    }

    /// Re-enable a previously disabled rule.
    pub fn enable(&mut self, id: &str) -> Result<()> {
        self.entry(id)?.enabled = true;
        Ok(())
    }

    /// Override a rule's severity for the upcoming scan.
    pub fn override_severity(&mut self, id: &str, severity: Severity) -> Result<()> {
        self.entry(id)?.effective_severity = severity;
        Ok(())
    }

    /// Whether a rule id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All registered rule ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Enabled rules applicable to a candidate kind, in ascending id order.
    pub fn rules_for(&self, kind: CandidateKind) -> Vec<ActiveRule<'_>> {
        self.rules
            .values()
            .filter(|r| r.enabled && r.rule.applies(kind))
            .map(|r| ActiveRule {
                id: r.rule.id(),
                severity: r.effective_severity,
                check: r.rule.check.as_ref(),
            })
            .collect()
    }

    fn entry(&mut self, id: &str) -> Result<&mut RegisteredRule> {
        self.rules.get_mut(id).ok_or_else(|| Error::UnknownRule {
            id: id.to_string(),
        })
    }
}
