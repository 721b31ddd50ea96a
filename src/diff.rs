//! Unified-diff range index.
//!
//! Parses a unified-diff document into a per-file set of changed line numbers
//! in the *new* version of each file. Context (`' '`) and addition (`'+'`)
//! lines count as changed for filtering purposes; deletions have no line in
//! the new file and are ignored. Built once per scan and read-only afterwards.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Per-file index of line numbers touched by a diff.
#[derive(Debug, Clone, Default)]
pub struct DiffIndex {
    files: BTreeMap<PathBuf, BTreeSet<usize>>,
}

impl DiffIndex {
    /// Parse a unified-diff document into an index.
    ///
    /// Accepts the conventional `--- a/file` / `+++ b/file` /
    /// `@@ -l,s +l,s @@` format, including `git diff` preamble lines between
    /// file sections. Malformed input is fatal ([`Error::DiffParse`]):
    /// filtering cannot be trusted on broken input.
    pub fn parse(text: &str) -> Result<Self> {
        let hunk_header =
            Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").expect("valid hunk regex");

        let mut files: BTreeMap<PathBuf, BTreeSet<usize>> = BTreeMap::new();
        // None until the first `+++` header; deleted files (`+++ /dev/null`)
        // stay in this state so their hunks are walked but not recorded.
        let mut current: Option<PathBuf> = None;
        let mut seen_target = false;
        let mut new_line = 0usize;
        let mut remaining_old = 0usize;
        let mut remaining_new = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            let in_hunk = remaining_old > 0 || remaining_new > 0;

            if in_hunk {
                match line.as_bytes().first() {
                    Some(b' ') => {
                        if remaining_old == 0 || remaining_new == 0 {
                            return Err(Error::DiffParse {
                                line: lineno,
                                message: "context line exceeds hunk length".to_string(),
                            });
                        }
                        remaining_old -= 1;
                        remaining_new -= 1;
                        if let Some(path) = &current {
                            files.entry(path.clone()).or_default().insert(new_line);
                        }
                        new_line += 1;
                    }
                    Some(b'+') => {
                        if remaining_new == 0 {
                            return Err(Error::DiffParse {
                                line: lineno,
                                message: "addition exceeds hunk length".to_string(),
                            });
                        }
                        remaining_new -= 1;
                        if let Some(path) = &current {
                            files.entry(path.clone()).or_default().insert(new_line);
                        }
                        new_line += 1;
                    }
                    Some(b'-') => {
                        if remaining_old == 0 {
                            return Err(Error::DiffParse {
                                line: lineno,
                                message: "deletion exceeds hunk length".to_string(),
                            });
                        }
                        remaining_old -= 1;
                    }
                    // "\ No newline at end of file"
                    Some(b'\\') => {}
                    _ => {
                        return Err(Error::DiffParse {
                            line: lineno,
                            message: format!("unexpected line inside hunk: '{line}'"),
                        });
                    }
                }
                continue;
            }

            if let Some(target) = line.strip_prefix("+++ ") {
                current = parse_target_path(target);
                seen_target = true;
            } else if line.starts_with("@@") {
                let captures = hunk_header.captures(line).ok_or_else(|| Error::DiffParse {
                    line: lineno,
                    message: format!("invalid hunk header: '{line}'"),
                })?;
                if !seen_target {
                    return Err(Error::DiffParse {
                        line: lineno,
                        message: "hunk header before any '+++' file header".to_string(),
                    });
                }
                new_line = captures[1].parse().map_err(|_| Error::DiffParse {
                    line: lineno,
                    message: "hunk start out of range".to_string(),
                })?;
                remaining_new = match captures.get(2) {
                    Some(m) => m.as_str().parse().map_err(|_| Error::DiffParse {
                        line: lineno,
                        message: "hunk length out of range".to_string(),
                    })?,
                    None => 1,
                };
                // The old-side length only gates how many '-'/' ' lines the
                // hunk body may carry.
                remaining_old = parse_old_length(line, lineno)?;
            }
            // Everything else outside a hunk ("--- a/...", "diff --git",
            // "index ...", mode lines) is preamble and skipped.
        }

        if remaining_old > 0 || remaining_new > 0 {
            return Err(Error::DiffParse {
                line: text.lines().count(),
                message: "diff ends inside a hunk".to_string(),
            });
        }

        Ok(Self { files })
    }

    /// Whether the diff marks `line` of `path` as changed. Paths absent from
    /// the diff yield `false` for every line.
    pub fn contains(&self, path: &Path, line: usize) -> bool {
        self.files
            .get(path)
            .map(|lines| lines.contains(&line))
            .unwrap_or(false)
    }

    /// Paths touched by the diff, in sorted order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Whether the diff touches no files at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Strip the conventional `a/` / `b/` prefix; `/dev/null` means no new file.
fn parse_target_path(target: &str) -> Option<PathBuf> {
    let target = target.split('\t').next().unwrap_or(target).trim();
    if target == "/dev/null" {
        return None;
    }
    let stripped = target
        .strip_prefix("b/")
        .or_else(|| target.strip_prefix("a/"))
        .unwrap_or(target);
    Some(PathBuf::from(stripped))
}

/// Extract the old-side hunk length from an already matched header.
fn parse_old_length(header: &str, lineno: usize) -> Result<usize> {
    let old_span = header
        .split(' ')
        .nth(1)
        .and_then(|s| s.strip_prefix('-'))
        .ok_or_else(|| Error::DiffParse {
            line: lineno,
            message: format!("invalid hunk header: '{header}'"),
        })?;
    match old_span.split_once(',') {
        Some((_, len)) => len.parse().map_err(|_| Error::DiffParse {
            line: lineno,
            message: "hunk length out of range".to_string(),
        }),
        None => Ok(1),
    }
}
