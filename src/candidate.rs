//! Artifact classification.
//!
//! Every input file is classified into exactly one [`CandidateKind`] before
//! rule execution. Classification is a pure function of the path, the parsed
//! content and the configured overrides; `Unknown` candidates are excluded
//! from rule execution but retained on the report as skipped.

use crate::parser::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Semantic type of an input artifact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    /// A playbook: a sequence of plays targeting hosts.
    Playbook,
    /// A task file inside a role's `tasks/` directory.
    RoleTasks,
    /// A handler file inside a role's `handlers/` directory.
    RoleHandlers,
    /// Default variables under `defaults/`.
    RoleDefaults,
    /// Role variables under `vars/`.
    RoleVars,
    /// Role metadata under `meta/`.
    RoleMeta,
    /// A template file.
    Template,
    /// An inventory file.
    Inventory,
    /// Unclassifiable; skipped during rule execution.
    Unknown,
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CandidateKind::Playbook => "playbook",
            CandidateKind::RoleTasks => "role-tasks",
            CandidateKind::RoleHandlers => "role-handlers",
            CandidateKind::RoleDefaults => "role-defaults",
            CandidateKind::RoleVars => "role-vars",
            CandidateKind::RoleMeta => "role-meta",
            CandidateKind::Template => "template",
            CandidateKind::Inventory => "inventory",
            CandidateKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// A classified input unit: path, kind and the parsed content tree.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Path of the source file.
    pub path: PathBuf,
    /// Classified artifact kind.
    pub kind: CandidateKind,
    /// Parsed content with per-node source positions.
    pub content: Node,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(path: impl Into<PathBuf>, kind: CandidateKind, content: Node) -> Self {
        Self {
            path: path.into(),
            kind,
            content,
        }
    }
}

/// Explicit per-path kind overrides supplied by configuration.
pub type KindOverrides = BTreeMap<PathBuf, CandidateKind>;

/// Classify a file into a candidate kind.
///
/// Decision order, highest priority first:
/// 1. an explicit override configured for the path;
/// 2. structural path heuristics (role directory names, inventory locations,
///    `templates/` layout);
/// 3. content heuristics over the parsed tree, when available;
/// 4. fallback [`CandidateKind::Unknown`].
///
/// Path-derived structure wins over content shape: a tasks file and a
/// handlers file are structurally identical, only their location tells them
/// apart. For the same reason a task-shaped document without directory
/// context classifies as `role-tasks`, never `role-handlers`; handlers
/// require a `handlers/` path component or an explicit override.
pub fn classify(path: &Path, content: Option<&Node>, overrides: &KindOverrides) -> CandidateKind {
    if let Some(kind) = overrides.get(path) {
        return *kind;
    }

    if let Some(kind) = classify_by_path(path) {
        return kind;
    }

    if let Some(kind) = content.and_then(classify_by_content) {
        return kind;
    }

    CandidateKind::Unknown
}

/// Structural directory heuristics.
fn classify_by_path(path: &Path) -> Option<CandidateKind> {
    let parent = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str());

    match parent {
        Some("tasks") => return Some(CandidateKind::RoleTasks),
        Some("handlers") => return Some(CandidateKind::RoleHandlers),
        Some("defaults") => return Some(CandidateKind::RoleDefaults),
        Some("vars") => return Some(CandidateKind::RoleVars),
        Some("meta") => return Some(CandidateKind::RoleMeta),
        _ => {}
    }

    let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or("");
    if stem == "inventory" || stem == "hosts" || parent == Some("inventory") {
        return Some(CandidateKind::Inventory);
    }

    let extension = path.extension().and_then(|e| e.to_str());
    let under_templates = path
        .components()
        .any(|c| c.as_os_str().to_str() == Some("templates"));
    if under_templates || extension == Some("j2") {
        return Some(CandidateKind::Template);
    }

    None
}

/// Content-shape heuristics over the parsed tree.
fn classify_by_content(content: &Node) -> Option<CandidateKind> {
    let items = content.items();
    if items.is_empty() || !items.iter().all(Node::is_mapping) {
        return None;
    }

    // Tasks never carry a `hosts` key, so any play-shaped element marks the
    // whole document as a playbook, even when sibling plays are missing it.
    if items.iter().any(|item| item.contains_key("hosts")) {
        return Some(CandidateKind::Playbook);
    }

    // A sequence of host-less mappings that look like tasks. Handlers are
    // indistinguishable by shape and are never inferred from content alone.
    if items.iter().all(looks_like_task) {
        return Some(CandidateKind::RoleTasks);
    }

    None
}

/// Whether a mapping carries a task-shaped key set.
fn looks_like_task(node: &Node) -> bool {
    if node.contains_key("hosts") {
        return false;
    }
    node.entries().next().is_some()
        && (node.contains_key("name")
            || node.contains_key("block")
            || node
                .entries()
                .any(|(key, _)| !crate::rules::TASK_KEYWORDS.contains(&key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use pretty_assertions::assert_eq;

    fn classify_path(path: &str) -> CandidateKind {
        classify(Path::new(path), None, &KindOverrides::new())
    }

    fn classify_content(yaml: &str) -> CandidateKind {
        let node = parse_document(yaml).unwrap();
        classify(Path::new("somefile.yml"), Some(&node), &KindOverrides::new())
    }

    #[test]
    fn test_role_directory_layout() {
        assert_eq!(
            classify_path("roles/web/tasks/main.yml"),
            CandidateKind::RoleTasks
        );
        assert_eq!(
            classify_path("roles/web/handlers/main.yml"),
            CandidateKind::RoleHandlers
        );
        assert_eq!(
            classify_path("roles/web/defaults/main.yml"),
            CandidateKind::RoleDefaults
        );
        assert_eq!(
            classify_path("roles/web/vars/main.yml"),
            CandidateKind::RoleVars
        );
        assert_eq!(
            classify_path("roles/web/meta/main.yml"),
            CandidateKind::RoleMeta
        );
    }

    #[test]
    fn test_inventory_locations() {
        assert_eq!(classify_path("hosts"), CandidateKind::Inventory);
        assert_eq!(classify_path("inventory.ini"), CandidateKind::Inventory);
        assert_eq!(
            classify_path("inventory/production"),
            CandidateKind::Inventory
        );
    }

    #[test]
    fn test_template_locations() {
        assert_eq!(
            classify_path("roles/web/templates/nginx.conf.j2"),
            CandidateKind::Template
        );
        assert_eq!(classify_path("motd.j2"), CandidateKind::Template);
    }

    #[test]
    fn test_playbook_by_content() {
        let kind = classify_content(
            "- hosts: all\n  tasks:\n    - name: Ping\n      ping:\n- hosts: web\n  roles:\n    - nginx\n",
        );
        assert_eq!(kind, CandidateKind::Playbook);
    }

    #[test]
    fn test_tasks_by_content() {
        let kind = classify_content("- name: Install\n  apt:\n    name: nginx\n");
        assert_eq!(kind, CandidateKind::RoleTasks);
    }

    #[test]
    fn test_handlers_never_inferred_from_content() {
        // Shape-identical to a handlers file; only the path can disambiguate.
        let kind = classify_content("- name: Restart nginx\n  service:\n    name: nginx\n    state: restarted\n");
        assert_eq!(kind, CandidateKind::RoleTasks);
    }

    #[test]
    fn test_path_beats_content() {
        let node = parse_document("- hosts: all\n  tasks: []\n").unwrap();
        let kind = classify(
            Path::new("roles/web/tasks/main.yml"),
            Some(&node),
            &KindOverrides::new(),
        );
        assert_eq!(kind, CandidateKind::RoleTasks);
    }

    #[test]
    fn test_override_beats_everything() {
        let mut overrides = KindOverrides::new();
        overrides.insert(
            PathBuf::from("roles/web/tasks/main.yml"),
            CandidateKind::RoleHandlers,
        );
        let kind = classify(Path::new("roles/web/tasks/main.yml"), None, &overrides);
        assert_eq!(kind, CandidateKind::RoleHandlers);
    }

    #[test]
    fn test_fallback_unknown() {
        assert_eq!(classify_path("README.md"), CandidateKind::Unknown);
        assert_eq!(classify_content("just a scalar\n"), CandidateKind::Unknown);
        assert_eq!(classify_content("key: value\n"), CandidateKind::Unknown);
    }
}
