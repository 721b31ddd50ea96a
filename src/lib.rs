//! # Playlint - Best-Practice Review for Automation Artifacts
//!
//! Playlint inspects configuration-as-code artifacts (playbooks, roles, task
//! files, inventories, templates) and reports violations of best-practice
//! rules. It is the rule-evaluation core only: argument parsing, config file
//! discovery, logging setup and output rendering are the embedding
//! application's concern.
//!
//! ## Core Concepts
//!
//! - **Candidate**: a single input file classified into a semantic artifact
//!   kind (playbook, role tasks, inventory, ...)
//! - **Rule**: an independent, stateless check bound to one or more candidate
//!   kinds, registered under a unique id
//! - **Violation**: one reported finding with location and severity
//! - **Diff range**: the per-file set of changed lines from a unified diff,
//!   used to restrict findings to what a patch actually touched
//! - **Report**: the deduplicated, deterministically ordered scan result with
//!   a pass/fail verdict
//!
//! ## Architecture Overview
//!
//! ```text
//! paths (+ optional diff)
//!        │
//!        ▼
//! ┌──────────────┐     ┌───────────────┐
//! │  Classifier  │────▶│  Rule Engine  │◀──── Rule Registry (frozen)
//! └──────────────┘     │  (parallel)   │◀──── Diff Range Index (frozen)
//!                      └───────┬───────┘
//!                              ▼
//!                      ┌───────────────┐
//!                      │    Report     │ filter ▸ dedup ▸ sort ▸ verdict
//!                      └───────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use playlint::{Scanner, Severity};
//!
//! let report = Scanner::with_builtin_rules()?
//!     .with_threshold(Severity::Warning)
//!     .scan(["site.yml", "roles/web/tasks/main.yml"])?;
//!
//! for violation in &report.violations {
//!     println!("{violation}");
//! }
//! if report.failed {
//!     std::process::exit(1);
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod modules;
pub mod parser;
pub mod registry;
pub mod report;
pub mod rules;
pub mod scanner;

pub use candidate::{classify, Candidate, CandidateKind, KindOverrides};
pub use config::RuleSelection;
pub use diff::DiffIndex;
pub use engine::RULE_FAILURE_ID;
pub use error::{Error, Result, RuleError};
pub use modules::{ArgumentSpec, ModuleIndex, StaticModuleIndex};
pub use parser::{parse_document, Node};
pub use registry::{Check, Finding, Rule, RuleRegistry};
pub use report::{Report, Severity, SeverityCounts, Skipped, Violation};
pub use scanner::{scan, Scanner};
