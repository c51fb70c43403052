//! In-memory edit planning.
//!
//! The planner takes an [`EditRequest`] together with what the filesystem
//! currently holds at the target path and produces either the final content
//! or a typed [`EditError`]. It never touches the disk: every operation runs
//! against a [`WorkingBuffer`] that holds the output of all previous
//! operations in the same request, so operation `k` always sees the result of
//! operations `0..k` and never a stale copy of the file.
//!
//! # Rules
//!
//! 1. A directory target fails before anything else is looked at.
//! 2. An absent target can only be created: operation 0 must have an empty
//!    `old_string`, and its `new_string` becomes the initial buffer.
//! 3. An empty `old_string` against an existing buffer is an attempt to
//!    create an existing file.
//! 4. Each remaining operation must differ from its replacement, match at
//!    least once, and match exactly once (or exactly `expected_replacements`
//!    times) unless `replace_all` is set.
//! 5. The first failure aborts the whole request.

use crate::errors::{ClosestMatch, EditError};
use crate::unescape::unescape;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum similarity for a line to be reported as a near miss.
const CLOSEST_MATCH_THRESHOLD: f64 = 0.6;

/// One exact-string substitution step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub old_string: String,
    pub new_string: String,
    #[serde(default)]
    pub replace_all: bool,
    /// Exact number of occurrences this operation must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_replacements: Option<usize>,
}

impl EditOperation {
    pub fn new(old_string: impl Into<String>, new_string: impl Into<String>) -> Self {
        Self {
            old_string: old_string.into(),
            new_string: new_string.into(),
            replace_all: false,
            expected_replacements: None,
        }
    }

    /// Operation that creates a file holding `content`.
    pub fn create(content: impl Into<String>) -> Self {
        Self::new(String::new(), content)
    }

    #[must_use]
    pub fn replace_all(mut self) -> Self {
        self.replace_all = true;
        self
    }

    #[must_use]
    pub fn expect(mut self, count: usize) -> Self {
        self.expected_replacements = Some(count);
        self
    }
}

/// An ordered list of operations against one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub path: PathBuf,
    #[serde(alias = "edits")]
    pub operations: Vec<EditOperation>,
    /// Default expectation for operations that do not carry their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_replacements: Option<usize>,
}

impl EditRequest {
    pub fn new(path: impl Into<PathBuf>, operations: Vec<EditOperation>) -> Self {
        Self {
            path: path.into(),
            operations,
            expected_replacements: None,
        }
    }

    /// Single-operation request.
    pub fn single(path: impl Into<PathBuf>, operation: EditOperation) -> Self {
        Self::new(path, vec![operation])
    }

    #[must_use]
    pub fn with_expected_replacements(mut self, count: usize) -> Self {
        self.expected_replacements = Some(count);
        self
    }

    fn expectation_for(&self, op: &EditOperation) -> Option<usize> {
        op.expected_replacements.or(self.expected_replacements)
    }
}

/// Buffer owned by the planner for the duration of one request.
#[derive(Debug)]
pub struct WorkingBuffer {
    content: String,
}

impl WorkingBuffer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Non-overlapping literal occurrences of `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.content.matches(needle).count()
    }

    /// Replace the first `limit` occurrences, or all of them when `limit` is
    /// `None`.
    pub fn replace(&mut self, old: &str, new: &str, limit: Option<usize>) {
        self.content = match limit {
            Some(n) => self.content.replacen(old, new, n),
            None => self.content.replace(old, new),
        };
    }

    pub fn into_inner(self) -> String {
        self.content
    }
}

/// Per-operation outcome of a successful plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub index: usize,
    pub replacements: usize,
    /// The match only succeeded after decoding escape sequences
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unescaped: bool,
}

/// Result of planning a request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a Plan does nothing until it is committed"]
pub struct Plan {
    /// Final content to commit
    pub content: String,
    /// The target did not exist and this plan creates it
    pub created: bool,
    pub outcomes: Vec<OperationOutcome>,
}

impl Plan {
    pub fn total_replacements(&self) -> usize {
        self.outcomes.iter().map(|o| o.replacements).sum()
    }

    pub fn per_operation(&self) -> Vec<usize> {
        self.outcomes.iter().map(|o| o.replacements).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerOptions {
    /// Retry an unmatched `old_string` with its escape sequences decoded
    pub unescape_fallback: bool,
}

/// Validates and applies edit requests in memory.
#[derive(Debug, Clone, Default)]
pub struct EditPlanner {
    options: PlannerOptions,
}

impl EditPlanner {
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> PlannerOptions {
        self.options
    }

    /// Plan `request` against the target's current state.
    ///
    /// `current` is `None` when the target does not exist.
    pub fn plan(
        &self,
        request: &EditRequest,
        current: Option<&str>,
        is_directory: bool,
    ) -> Result<Plan, EditError> {
        let path = request.path.as_path();

        if is_directory {
            return Err(EditError::FileIsDirectory {
                path: path.to_path_buf(),
            });
        }

        let mut outcomes = Vec::with_capacity(request.operations.len());
        let (mut buffer, first, created) = match current {
            // An empty old_string here, at any index, is caught per operation.
            Some(content) => (WorkingBuffer::new(content), 0, false),
            None => {
                let Some(op) = request.operations.first() else {
                    return Err(EditError::NotFound {
                        path: path.to_path_buf(),
                        index: None,
                    });
                };
                if !op.old_string.is_empty() {
                    return Err(EditError::NotFound {
                        path: path.to_path_buf(),
                        index: Some(0),
                    });
                }
                outcomes.push(OperationOutcome {
                    index: 0,
                    replacements: 0,
                    unescaped: false,
                });
                (WorkingBuffer::new(op.new_string.as_str()), 1, true)
            }
        };

        for (index, op) in request.operations.iter().enumerate().skip(first) {
            let outcome = self.apply_operation(path, request, index, op, &mut buffer)?;
            log::debug!(
                "{}: operation {} replaced {} occurrence(s)",
                path.display(),
                index,
                outcome.replacements
            );
            outcomes.push(outcome);
        }

        Ok(Plan {
            content: buffer.into_inner(),
            created,
            outcomes,
        })
    }

    fn apply_operation(
        &self,
        path: &Path,
        request: &EditRequest,
        index: usize,
        op: &EditOperation,
        buffer: &mut WorkingBuffer,
    ) -> Result<OperationOutcome, EditError> {
        if op.old_string.is_empty() {
            return Err(EditError::AttemptCreateExistingFile {
                path: path.to_path_buf(),
                index,
            });
        }

        if op.old_string == op.new_string {
            return Err(EditError::OldNewIdentical {
                path: path.to_path_buf(),
                index,
            });
        }

        let mut old = op.old_string.as_str();
        let mut new = op.new_string.as_str();
        let mut count = buffer.count(old);
        let mut unescaped = false;

        // Only hold the decoded strings when the literal match failed.
        let decoded;
        if count == 0 && self.options.unescape_fallback {
            if let Some(candidate) = unescape(old) {
                let hits = buffer.count(&candidate);
                if hits > 0 {
                    let replacement = unescape(new).unwrap_or_else(|| {
                        if new.contains('\\') {
                            log::warn!(
                                "{}: operation {} new_string could not be unescaped, using it verbatim",
                                path.display(),
                                index
                            );
                        }
                        new.to_string()
                    });
                    if candidate == replacement {
                        return Err(EditError::OldNewIdentical {
                            path: path.to_path_buf(),
                            index,
                        });
                    }
                    decoded = (candidate, replacement);
                    old = &decoded.0;
                    new = &decoded.1;
                    count = hits;
                    unescaped = true;
                    log::info!(
                        "{}: operation {} matched only after unescaping old_string",
                        path.display(),
                        index
                    );
                }
            }
        }

        if count == 0 {
            return Err(EditError::NoOccurrenceFound {
                path: path.to_path_buf(),
                index,
                hint: closest_line(buffer.as_str(), &op.old_string),
            });
        }

        let expected = request.expectation_for(op);
        match expected {
            Some(expected) if expected != count => {
                return Err(EditError::ExpectedReplacementsMismatch {
                    path: path.to_path_buf(),
                    index,
                    expected,
                    actual: count,
                });
            }
            None if !op.replace_all && count > 1 => {
                return Err(EditError::MultipleMatches {
                    path: path.to_path_buf(),
                    index,
                    count,
                });
            }
            _ => {}
        }

        // A satisfied expectation covers every occurrence it counted.
        buffer.replace(old, new, None);

        Ok(OperationOutcome {
            index,
            replacements: count,
            unescaped,
        })
    }
}

/// Find the buffer line most similar to the first non-blank line of `needle`.
fn closest_line(haystack: &str, needle: &str) -> Option<ClosestMatch> {
    let probe = needle.lines().map(str::trim).find(|l| !l.is_empty())?;

    haystack
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let similarity = strsim::normalized_levenshtein(line.trim(), probe);
            (idx, line, similarity)
        })
        .filter(|(_, _, similarity)| *similarity >= CLOSEST_MATCH_THRESHOLD)
        .max_by(|a, b| a.2.total_cmp(&b.2).then(b.0.cmp(&a.0)))
        .map(|(idx, line, similarity)| ClosestMatch {
            line: idx + 1,
            text: line.to_string(),
            similarity,
        })
}
