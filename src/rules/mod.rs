//! Builtin rule catalog.
//!
//! Rules are defined as plain check functions (or small structs for checks
//! that carry injected state) and assembled into an explicit registration
//! table by [`builtin_rules`]. Nothing here is discovered at runtime; adding
//! a rule means adding it to the table.

mod play;
mod role;
mod tasks;

use crate::candidate::Candidate;
use crate::modules::{ModuleIndex, StaticModuleIndex};
use crate::parser::Node;
use crate::registry::Rule;
use std::sync::Arc;

pub use tasks::ModuleArgumentsCheck;

/// Keys with task-control meaning. Any other key on a task mapping is taken
/// to be the module being invoked.
pub const TASK_KEYWORDS: &[&str] = &[
    "name", "action", "when", "loop", "loop_control", "register", "notify", "listen",
    "ignore_errors", "ignore_unreachable", "changed_when", "failed_when", "tags",
    "become", "become_method", "become_user", "become_flags", "sudo", "sudo_user",
    "delegate_to", "delegate_facts", "local_action", "run_once",
    "retries", "delay", "until", "async", "poll",
    "environment", "vars", "args", "block", "rescue", "always",
    "connection", "throttle", "timeout", "no_log", "diff", "check_mode",
    "module_defaults", "any_errors_fatal", "debugger", "collections",
];

/// Keys under a play that hold task lists.
pub(crate) const PLAY_TASK_SECTIONS: &[&str] = &["pre_tasks", "tasks", "post_tasks", "handlers"];

/// The builtin rule table, backed by the default static module index.
pub fn builtin_rules() -> Vec<Rule> {
    builtin_rules_with_index(Arc::new(StaticModuleIndex::with_builtins()))
}

/// The builtin rule table with an injected module-metadata lookup.
pub fn builtin_rules_with_index(index: Arc<dyn ModuleIndex>) -> Vec<Rule> {
    let mut rules = vec![tasks::module_arguments(index)];
    rules.extend(tasks::rules());
    rules.extend(play::rules());
    rules.extend(role::rules());
    rules
}

/// Visit every task mapping reachable from a candidate, including tasks
/// nested in `block` / `rescue` / `always` sections.
pub(crate) fn for_each_task(candidate: &Candidate, visit: &mut dyn FnMut(&Node)) {
    match candidate.kind {
        crate::candidate::CandidateKind::Playbook => {
            for play in candidate.content.items() {
                for section in PLAY_TASK_SECTIONS {
                    if let Some(list) = play.get(section) {
                        for task in list.items() {
                            walk_task(task, visit);
                        }
                    }
                }
            }
        }
        crate::candidate::CandidateKind::RoleTasks
        | crate::candidate::CandidateKind::RoleHandlers => {
            for task in candidate.content.items() {
                walk_task(task, visit);
            }
        }
        _ => {}
    }
}

fn walk_task(task: &Node, visit: &mut dyn FnMut(&Node)) {
    if !task.is_mapping() {
        return;
    }
    visit(task);
    for section in ["block", "rescue", "always"] {
        if let Some(list) = task.get(section) {
            for nested in list.items() {
                walk_task(nested, visit);
            }
        }
    }
}

/// The module invoked by a task, if any: the first key that is neither a
/// task keyword nor a legacy `with_*` loop form.
pub(crate) fn module_key<'a>(task: &'a Node) -> Option<(&'a str, &'a Node)> {
    task.entries()
        .find(|(key, _)| !TASK_KEYWORDS.contains(key) && !key.starts_with("with_"))
}
