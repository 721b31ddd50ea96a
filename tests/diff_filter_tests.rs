//! Integration tests for diff-restricted scans: only findings on lines the
//! patch touched survive, files absent from the diff are fully suppressed,
//! and broken diff input aborts before evaluation.

use playlint::{Error, RuleSelection, Scanner, Severity};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Two tasks files with unnamed tasks on known lines: `a` at lines 5 and 11,
/// `b` at line 1.
fn fixture() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let a_dir = dir.path().join("roles/alpha/tasks");
    let b_dir = dir.path().join("roles/beta/tasks");
    fs::create_dir_all(&a_dir).unwrap();
    fs::create_dir_all(&b_dir).unwrap();

    let a = a_dir.join("main.yml");
    fs::write(
        &a,
        "\
- name: One
  ping:
- name: Two
  ping:
- ping:
- name: Three
  ping:
- name: Four
  ping:
- name: Five
- ping:
",
    )
    .unwrap();

    let b = b_dir.join("main.yml");
    fs::write(&b, "- ping:\n").unwrap();

    (dir, a, b)
}

fn only_task_names() -> RuleSelection {
    RuleSelection {
        enabled: Some(vec!["require-task-name".to_string()]),
        ..RuleSelection::default()
    }
}

#[test]
fn test_without_diff_everything_is_reported() {
    let (_dir, a, b) = fixture();
    let report = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only_task_names())
        .unwrap()
        .scan([&a, &b])
        .unwrap();

    let lines: Vec<(PathBuf, usize)> = report
        .violations
        .iter()
        .map(|v| (v.path.clone(), v.line))
        .collect();
    assert_eq!(
        lines,
        vec![(a.clone(), 5), (a.clone(), 11), (b.clone(), 1)]
    );
}

#[test]
fn test_diff_restricts_to_changed_lines() {
    let (_dir, a, b) = fixture();

    // The patch touches only lines 10-12 of file `a`.
    let diff = format!(
        "--- {path}\n+++ {path}\n@@ -10,3 +10,3 @@\n line ten\n line eleven\n line twelve\n",
        path = a.display()
    );

    let report = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only_task_names())
        .unwrap()
        .with_diff(&diff)
        .unwrap()
        .scan([&a, &b])
        .unwrap();

    // Line 5 of `a` is outside the range; `b` is absent from the diff.
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].path, a);
    assert_eq!(report.violations[0].line, 11);
    assert!(report.failed);
}

#[test]
fn test_empty_diff_suppresses_all_findings() {
    let (_dir, a, b) = fixture();

    let report = Scanner::with_builtin_rules()
        .unwrap()
        .with_selection(&only_task_names())
        .unwrap()
        .with_diff("")
        .unwrap()
        .scan([&a, &b])
        .unwrap();

    assert!(report.violations.is_empty());
    assert!(!report.failed);
}

#[test]
fn test_malformed_diff_aborts_the_scan() {
    let result = Scanner::with_builtin_rules()
        .unwrap()
        .with_diff("@@ -1 +1 @@\n+orphan hunk\n");
    assert!(matches!(result, Err(Error::DiffParse { .. })));
}

#[test]
fn test_diff_filtering_is_deterministic() {
    let (_dir, a, b) = fixture();
    let diff = format!(
        "--- {path}\n+++ {path}\n@@ -4,2 +4,2 @@\n line four\n line five\n",
        path = a.display()
    );

    let run = || {
        let report = Scanner::with_builtin_rules()
            .unwrap()
            .with_selection(&only_task_names())
            .unwrap()
            .with_diff(&diff)
            .unwrap()
            .with_threshold(Severity::Warning)
            .scan([&a, &b])
            .unwrap();
        serde_json::to_string(&report).unwrap()
    };

    assert_eq!(run(), run());
}
