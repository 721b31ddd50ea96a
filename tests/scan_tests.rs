//! Integration tests for the scan pipeline: classification, rule execution,
//! isolation, verdict computation and report determinism.

use playlint::{
    Candidate, CandidateKind, Error, Finding, Report, Rule, RuleError, RuleRegistry,
    RuleSelection, Scanner, Severity, RULE_FAILURE_ID,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A role layout with one tasks file containing a single unnamed task on a
/// known line.
fn role_fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let tasks_dir = dir.path().join("roles/web/tasks");
    fs::create_dir_all(&tasks_dir).unwrap();
    let tasks = tasks_dir.join("main.yml");
    fs::write(
        &tasks,
        "- name: Install nginx\n  apt:\n    name: nginx\n- ping:\n",
    )
    .unwrap();
    (dir, tasks)
}

fn only(rule: &str) -> RuleSelection {
    RuleSelection {
        enabled: Some(vec![rule.to_string()]),
        ..RuleSelection::default()
    }
}

#[test]
fn test_unnamed_task_scenario() {
    let (_dir, tasks) = role_fixture();

    let scanner = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only("require-task-name"))
        .unwrap();
    let report = scanner.scan([&tasks]).unwrap();

    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.rule_id, "require-task-name");
    assert_eq!(violation.path, tasks);
    assert_eq!(violation.line, 4);
    assert_eq!(violation.severity, Severity::Warning);
    assert!(report.failed);
    assert_eq!(report.counts.warning, 1);
    assert_eq!(report.counts.total(), 1);
}

#[test]
fn test_verdict_depends_on_threshold() {
    let (_dir, tasks) = role_fixture();

    let warning = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only("require-task-name"))
        .unwrap()
        .with_threshold(Severity::Warning)
        .scan([&tasks])
        .unwrap();
    assert!(warning.failed);

    let info = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only("require-task-name"))
        .unwrap()
        .with_threshold(Severity::Info)
        .scan([&tasks])
        .unwrap();
    assert!(info.failed);

    let error = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only("require-task-name"))
        .unwrap()
        .with_threshold(Severity::Error)
        .scan([&tasks])
        .unwrap();
    assert!(!error.failed);
}

#[test]
fn test_playbook_rules_fire_regardless_of_path() {
    let dir = TempDir::new().unwrap();
    let playbook = dir.path().join("anything-at-all.yml");
    fs::write(
        &playbook,
        "- hosts: all\n  tasks: []\n- name: No targets\n  tasks: []\n",
    )
    .unwrap();

    let scanner = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only("require-hosts"))
        .unwrap();
    let report = scanner.scan([&playbook]).unwrap();

    // Content classifies this as a playbook even though the path says
    // nothing; the second play is missing hosts.
    assert!(report.skipped.is_empty());
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].line, 3);
    assert_eq!(report.violations[0].severity, Severity::Error);
}

#[test]
fn test_duplicate_registration_fails_before_any_file_is_read() {
    fn noop(_: &Candidate) -> Result<Vec<Finding>, RuleError> {
        Ok(Vec::new())
    }

    let mut registry = RuleRegistry::new();
    registry
        .register(
            Rule::new("no-bare-name", Severity::Warning, noop).applies_to(CandidateKind::Playbook),
        )
        .unwrap();
    let err = registry
        .register(
            Rule::new("no-bare-name", Severity::Error, noop).applies_to(CandidateKind::RoleTasks),
        )
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateRule { id } if id == "no-bare-name"));
}

#[test]
fn test_rule_isolation_end_to_end() {
    fn always_panic(_: &Candidate) -> Result<Vec<Finding>, RuleError> {
        panic!("broken rule");
    }

    let (_dir, tasks) = role_fixture();

    let mut registry = RuleRegistry::with_builtin_rules().unwrap();
    registry
        .register(Rule::new("zz-broken", Severity::Warning, always_panic).applies_to_task_files())
        .unwrap();

    let report = Scanner::new(registry).scan([&tasks]).unwrap();

    let failures: Vec<_> = report
        .violations
        .iter()
        .filter(|v| v.rule_id == RULE_FAILURE_ID)
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("zz-broken"));
    assert_eq!(failures[0].severity, Severity::Error);

    // Every other applicable rule still reported its true findings.
    assert!(report
        .violations
        .iter()
        .any(|v| v.rule_id == "require-task-name"));
}

#[test]
fn test_scan_is_idempotent() {
    let (_dir, tasks) = role_fixture();
    let playbook = tasks.parent().unwrap().parent().unwrap().join("site.yml");
    fs::write(
        &playbook,
        "- hosts: all\n  tasks:\n    - shell: echo hello\n    - name: fine\n      command: ls\n",
    )
    .unwrap();

    let run = || -> Report {
        Scanner::with_builtin_rules()
            .unwrap()
            .scan([&tasks, &playbook])
            .unwrap()
    };

    let first = serde_json::to_string(&run()).unwrap();
    let second = serde_json::to_string(&run()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_report_serialization_shape() {
    let (_dir, tasks) = role_fixture();

    let report = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only("require-task-name"))
        .unwrap()
        .scan([tasks.as_path(), Path::new("/missing/file.yml")])
        .unwrap();

    let value = serde_json::to_value(&report).unwrap();
    let violation = &value["violations"][0];
    assert!(violation["rule_id"].is_string());
    assert!(violation["path"].is_string());
    assert!(violation["line"].is_u64());
    assert!(violation.get("column").is_some());
    assert!(violation["message"].is_string());
    assert_eq!(violation["severity"], "warning");
    assert!(value["counts"]["warning"].is_u64());
    assert!(value["failed"].is_boolean());
    assert_eq!(value["skipped"].as_array().unwrap().len(), 1);
}

#[test]
fn test_severity_override_changes_verdict() {
    let (_dir, tasks) = role_fixture();

    let selection = RuleSelection {
        enabled: Some(vec!["require-task-name".to_string()]),
        disabled: Vec::new(),
        severity_overrides: [("require-task-name".to_string(), Severity::Info)]
            .into_iter()
            .collect(),
    };

    let report = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&selection)
        .unwrap()
        .scan([&tasks])
        .unwrap();

    assert_eq!(report.violations[0].severity, Severity::Info);
    // Info findings do not fail a warning-threshold scan.
    assert!(!report.failed);
}

#[test]
fn test_scan_entry_point() {
    let (_dir, tasks) = role_fixture();
    let report = playlint::scan(
        [&tasks],
        &only("require-task-name"),
        None,
        Severity::Warning,
    )
    .unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.failed);
}
