//! Error types for Playlint.
//!
//! This module defines the error types used throughout Playlint. Only
//! configuration-time problems (duplicate or unknown rule ids, an invalid
//! severity threshold) and malformed diff input are fatal to a scan; every
//! per-candidate and per-rule problem is converted into report-visible data
//! instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Playlint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Playlint.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors (fatal, raised before any candidate is processed)
    // ========================================================================
    /// A rule with the same id is already registered.
    #[error("Rule '{id}' is already registered")]
    DuplicateRule {
        /// The conflicting rule id
        id: String,
    },

    /// A rule id used in configuration does not exist in the registry.
    #[error("Unknown rule '{id}' referenced in configuration")]
    UnknownRule {
        /// The unrecognized rule id
        id: String,
    },

    /// A rule tried to register under an id reserved by the engine.
    #[error("Rule id '{id}' is reserved")]
    ReservedRuleId {
        /// The reserved id
        id: String,
    },

    /// A severity threshold string could not be parsed.
    #[error("Invalid severity threshold '{value}' (expected info, warning or error)")]
    InvalidThreshold {
        /// The rejected input
        value: String,
    },

    /// Error reading a rule selection document.
    #[error("Failed to load rule selection: {0}")]
    SelectionParse(String),

    // ========================================================================
    // Classification Errors (fatal only in strict mode)
    // ========================================================================
    /// A candidate could not be classified and strict classification is on.
    #[error("Unable to classify '{path}': {reason}")]
    Classification {
        /// Path to the unclassifiable file
        path: PathBuf,
        /// Why classification failed
        reason: String,
    },

    // ========================================================================
    // Diff Errors (fatal, filtering cannot proceed on broken input)
    // ========================================================================
    /// Malformed unified-diff input.
    #[error("Malformed unified diff at line {line}: {message}")]
    DiffParse {
        /// 1-indexed line in the diff document
        line: usize,
        /// What went wrong
        message: String,
    },
}

/// Failure raised by a rule's check function.
///
/// Contained per (candidate, rule) pair by the engine and surfaced as a
/// synthetic violation, never propagated to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RuleError(pub String);

impl RuleError {
    /// Create a new rule execution error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
