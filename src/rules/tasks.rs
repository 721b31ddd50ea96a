//! Task-level rules.
//!
//! These run against every task mapping reachable from a playbook, tasks
//! file or handlers file, including tasks nested inside blocks.

use super::{for_each_task, module_key};
use crate::candidate::{Candidate, CandidateKind};
use crate::error::RuleError;
use crate::modules::ModuleIndex;
use crate::parser::Node;
use crate::registry::{Check, Finding, Rule};
use crate::report::Severity;
use std::sync::Arc;

type CheckResult = std::result::Result<Vec<Finding>, RuleError>;

/// Characters whose presence justifies `shell` over `command`.
const SHELL_FEATURES: &[char] = &[
    '|', '>', '<', '&', ';', '$', '`', '(', ')', '{', '}', '*', '?', '[', ']',
];

/// Loop forms superseded by `loop`.
const LEGACY_LOOPS: &[&str] = &[
    "with_items", "with_dict", "with_nested", "with_together", "with_subelements",
    "with_sequence", "with_random_choice", "with_first_found", "with_indexed_items",
    "with_flattened",
];

/// The task-level part of the builtin table.
pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new("require-task-name", Severity::Warning, require_task_name)
            .applies_to_task_files(),
        Rule::new("task-name-case", Severity::Info, task_name_case).applies_to_task_files(),
        Rule::new("no-deprecated-sudo", Severity::Warning, no_deprecated_sudo)
            .applies_to_task_files(),
        Rule::new("prefer-command", Severity::Warning, prefer_command).applies_to_task_files(),
        Rule::new("command-idempotency", Severity::Info, command_idempotency)
            .applies_to_task_files(),
        Rule::new("no-with-loops", Severity::Info, no_with_loops).applies_to_task_files(),
        Rule::new(
            "become-user-requires-become",
            Severity::Warning,
            become_user_requires_become,
        )
        .applies_to_task_files(),
        Rule::new("retries-require-until", Severity::Warning, retries_require_until)
            .applies_to_task_files(),
        Rule::new("git-requires-version", Severity::Warning, git_requires_version)
            .applies_to(CandidateKind::Playbook)
            .applies_to(CandidateKind::RoleTasks),
    ]
}

/// The `module-arguments` rule, bound to an injected module index.
pub(super) fn module_arguments(index: Arc<dyn ModuleIndex>) -> Rule {
    Rule::new(
        "module-arguments",
        Severity::Error,
        ModuleArgumentsCheck { index },
    )
    .applies_to_task_files()
}

fn require_task_name(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        match task.get("name").and_then(Node::as_str) {
            None => findings.push(
                Finding::new(task.line(), "Task has no name").with_column(task.column()),
            ),
            Some(name) if name.trim().is_empty() => findings.push(
                Finding::new(task.line(), "Task has an empty name").with_column(task.column()),
            ),
            Some(_) => {}
        }
    });
    Ok(findings)
}

fn task_name_case(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        if let Some(node) = task.get("name") {
            if let Some(name) = node.as_str() {
                if name.starts_with(|c: char| c.is_lowercase()) {
                    findings.push(Finding::new(
                        node.line(),
                        format!("Task name '{name}' should start with an uppercase letter"),
                    ));
                }
            }
        }
    });
    Ok(findings)
}

fn no_deprecated_sudo(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        for (key, replacement) in [("sudo", "become"), ("sudo_user", "become_user")] {
            if let Some(node) = task.get(key) {
                findings.push(Finding::new(
                    node.line(),
                    format!("'{key}' is deprecated, use '{replacement}' instead"),
                ));
            }
        }
    });
    Ok(findings)
}

fn prefer_command(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        let Some(args) = task.get("shell") else {
            return;
        };
        if args.is_empty() {
            return;
        }
        let cmd = match args.as_str() {
            Some(s) => Some(s),
            None => args.get("cmd").and_then(Node::as_str),
        };
        if let Some(cmd) = cmd {
            if !cmd.contains(SHELL_FEATURES) {
                findings.push(Finding::new(
                    args.line(),
                    "Use the 'command' module when shell features are not needed",
                ));
            }
        }
    });
    Ok(findings)
}

fn command_idempotency(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        for module in ["command", "shell"] {
            let Some(args) = task.get(module) else {
                continue;
            };
            let guarded_args = args.contains_key("creates")
                || args.contains_key("removes")
                || args
                    .as_str()
                    .map(|s| s.contains("creates=") || s.contains("removes="))
                    .unwrap_or(false);
            let guarded_task = task.contains_key("changed_when")
                || task
                    .get("args")
                    .map(|args| args.contains_key("creates") || args.contains_key("removes"))
                    .unwrap_or(false);
            if !guarded_args && !guarded_task {
                findings.push(Finding::new(
                    args.line(),
                    format!("'{module}' used without an idempotency guard (creates, removes or changed_when)"),
                ));
            }
        }
    });
    Ok(findings)
}

fn no_with_loops(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        for (key, node) in task.entries() {
            if LEGACY_LOOPS.contains(&key) {
                findings.push(Finding::new(
                    node.line(),
                    format!("'{key}' is superseded by 'loop'"),
                ));
            }
        }
    });
    Ok(findings)
}

fn become_user_requires_become(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        if let Some(node) = task.get("become_user") {
            if !task.contains_key("become") {
                findings.push(Finding::new(
                    node.line(),
                    "'become_user' has no effect without 'become'",
                ));
            }
        }
    });
    Ok(findings)
}

fn retries_require_until(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        if let Some(node) = task.get("retries") {
            if !task.contains_key("until") {
                findings.push(Finding::new(
                    node.line(),
                    "'retries' specified without an 'until' condition",
                ));
            }
        }
    });
    Ok(findings)
}

fn git_requires_version(candidate: &Candidate) -> CheckResult {
    let mut findings = Vec::new();
    for_each_task(candidate, &mut |task| {
        let Some(args) = task.get("git") else {
            return;
        };
        let pinned = args.contains_key("version")
            || args
                .as_str()
                .map(|s| s.contains("version="))
                .unwrap_or(false);
        if !pinned {
            findings.push(Finding::new(
                args.line(),
                "'git' used without a pinned version, tag or branch",
            ));
        }
    });
    Ok(findings)
}

/// Validates module options against the injected [`ModuleIndex`].
///
/// Modules absent from the index produce no findings; the lookup service is
/// authoritative only for what it knows about.
pub struct ModuleArgumentsCheck {
    index: Arc<dyn ModuleIndex>,
}

impl ModuleArgumentsCheck {
    /// Create the check around a lookup service.
    pub fn new(index: Arc<dyn ModuleIndex>) -> Self {
        Self { index }
    }
}

impl Check for ModuleArgumentsCheck {
    fn run(&self, candidate: &Candidate) -> CheckResult {
        let mut findings = Vec::new();
        for_each_task(candidate, &mut |task| {
            let Some((module, args)) = module_key(task) else {
                return;
            };
            let Some(spec) = self.index.lookup(module) else {
                return;
            };

            if args.is_mapping() {
                for (option, node) in args.entries() {
                    if !spec.recognizes(option) {
                        findings.push(Finding::new(
                            node.line(),
                            format!("Unknown option '{option}' for module '{module}'"),
                        ));
                    }
                }
                for required in &spec.required {
                    if !args.contains_key(required) {
                        findings.push(Finding::new(
                            args.line(),
                            format!("Module '{module}' is missing required option '{required}'"),
                        ));
                    }
                }
            } else if args.is_scalar() && !args.is_empty() && !spec.free_form {
                findings.push(Finding::new(
                    args.line(),
                    format!("Module '{module}' does not accept free-form arguments"),
                ));
            }
        });
        Ok(findings)
    }
}
