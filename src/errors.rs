//! Error taxonomy for the edit engine.
//!
//! Every failure the engine can produce is an [`EditError`]. Each variant maps
//! onto exactly one [`EditErrorKind`], which carries a stable machine code for
//! callers that branch on failures instead of parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditErrorKind {
    NotFound,
    FileIsDirectory,
    NoOccurrenceFound,
    MultipleMatches,
    ExpectedReplacementsMismatch,
    OldNewIdentical,
    AttemptCreateExistingFile,
    PermissionDenied,
    #[serde(rename = "IOError")]
    IoError,
}

impl EditErrorKind {
    /// Stable code for this kind.
    pub fn code(self) -> &'static str {
        match self {
            EditErrorKind::NotFound => "EDIT_FILE_NOT_FOUND",
            EditErrorKind::FileIsDirectory => "EDIT_FILE_IS_DIRECTORY",
            EditErrorKind::NoOccurrenceFound => "EDIT_NO_OCCURRENCE_FOUND",
            EditErrorKind::MultipleMatches => "EDIT_MULTIPLE_MATCHES",
            EditErrorKind::ExpectedReplacementsMismatch => "EDIT_EXPECTED_OCCURRENCE_MISMATCH",
            EditErrorKind::OldNewIdentical => "EDIT_OLD_NEW_IDENTICAL",
            EditErrorKind::AttemptCreateExistingFile => "ATTEMPT_TO_CREATE_EXISTING_FILE",
            EditErrorKind::PermissionDenied => "EDIT_PERMISSION_DENIED",
            EditErrorKind::IoError => "EDIT_IO_ERROR",
        }
    }
}

impl fmt::Display for EditErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Filesystem step during which an I/O error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStage {
    /// Inspecting the target's metadata
    Probe,
    /// Reading the target's current content
    Read,
    /// Creating missing parent directories for a new file
    CreateParent,
    /// Creating the temporary file next to the target
    TempCreate,
    /// Writing, flushing or setting permissions on the temporary file
    TempWrite,
    /// Renaming the temporary file onto the target
    Rename,
}

impl fmt::Display for IoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            IoStage::Probe => "failed to stat file",
            IoStage::Read => "failed to read file",
            IoStage::CreateParent => "failed to create parent directory",
            IoStage::TempCreate => "failed to create temporary file",
            IoStage::TempWrite => "failed to write temporary file",
            IoStage::Rename => "failed to rename temporary file onto target",
        };
        f.write_str(stage)
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("{}", not_found_message(.path, .index))]
    NotFound {
        path: PathBuf,
        /// `None` when the request has no operations at all
        index: Option<usize>,
    },

    #[error("Is a directory: {}", .path.display())]
    FileIsDirectory { path: PathBuf },

    #[error("{}", no_occurrence_message(.path, .index, .hint))]
    NoOccurrenceFound {
        path: PathBuf,
        index: usize,
        hint: Option<ClosestMatch>,
    },

    #[error(
        "old_string of operation {index} matched {count} locations in {}, expected exactly 1; \
         add surrounding context or set replace_all",
        .path.display()
    )]
    MultipleMatches {
        path: PathBuf,
        index: usize,
        count: usize,
    },

    #[error(
        "expected {expected} replacement(s) but found {actual} for operation {index} in {}",
        .path.display()
    )]
    ExpectedReplacementsMismatch {
        path: PathBuf,
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("old_string and new_string of operation {index} are identical; no change to {}", .path.display())]
    OldNewIdentical { path: PathBuf, index: usize },

    #[error(
        "File exists: {} (operation {index} has an empty old_string, which only creates new files)",
        .path.display()
    )]
    AttemptCreateExistingFile { path: PathBuf, index: usize },

    #[error("Permission denied: {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage} for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        stage: IoStage,
        #[source]
        source: io::Error,
    },
}

/// Most similar line in the buffer to a missing `old_string`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestMatch {
    /// 1-based line number in the buffer the operation ran against
    pub line: usize,
    pub text: String,
    pub similarity: f64,
}

fn not_found_message(path: &std::path::Path, index: &Option<usize>) -> String {
    match index {
        Some(index) => format!(
            "No such file or directory: {} (operation {index} requires an existing file)",
            path.display()
        ),
        None => format!("No such file or directory: {}", path.display()),
    }
}

fn no_occurrence_message(
    path: &std::path::Path,
    index: &usize,
    hint: &Option<ClosestMatch>,
) -> String {
    let mut message = format!(
        "could not find old_string of operation {index} in {}; it must match the file exactly, \
         including whitespace and indentation",
        path.display()
    );
    if let Some(hint) = hint {
        message.push_str(&format!(
            " (closest line {}: {:?})",
            hint.line,
            hint.text.trim_end()
        ));
    }
    message
}

impl EditError {
    /// Build an I/O error, promoting permission failures to their own kind.
    pub fn io(path: impl Into<PathBuf>, stage: IoStage, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            EditError::PermissionDenied { path, source }
        } else {
            EditError::Io {
                path,
                stage,
                source,
            }
        }
    }

    pub fn kind(&self) -> EditErrorKind {
        match self {
            EditError::NotFound { .. } => EditErrorKind::NotFound,
            EditError::FileIsDirectory { .. } => EditErrorKind::FileIsDirectory,
            EditError::NoOccurrenceFound { .. } => EditErrorKind::NoOccurrenceFound,
            EditError::MultipleMatches { .. } => EditErrorKind::MultipleMatches,
            EditError::ExpectedReplacementsMismatch { .. } => {
                EditErrorKind::ExpectedReplacementsMismatch
            }
            EditError::OldNewIdentical { .. } => EditErrorKind::OldNewIdentical,
            EditError::AttemptCreateExistingFile { .. } => EditErrorKind::AttemptCreateExistingFile,
            EditError::PermissionDenied { .. } => EditErrorKind::PermissionDenied,
            EditError::Io { .. } => EditErrorKind::IoError,
        }
    }

    /// Path the failure refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            EditError::NotFound { path, .. }
            | EditError::FileIsDirectory { path }
            | EditError::NoOccurrenceFound { path, .. }
            | EditError::MultipleMatches { path, .. }
            | EditError::ExpectedReplacementsMismatch { path, .. }
            | EditError::OldNewIdentical { path, .. }
            | EditError::AttemptCreateExistingFile { path, .. }
            | EditError::PermissionDenied { path, .. }
            | EditError::Io { path, .. } => path,
        }
    }

    /// Index of the failing operation, for content errors.
    pub fn operation_index(&self) -> Option<usize> {
        match self {
            EditError::NotFound { index, .. } => *index,
            EditError::NoOccurrenceFound { index, .. }
            | EditError::MultipleMatches { index, .. }
            | EditError::ExpectedReplacementsMismatch { index, .. }
            | EditError::OldNewIdentical { index, .. }
            | EditError::AttemptCreateExistingFile { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Stage of an I/O failure. `None` for every non-I/O kind.
    pub fn io_stage(&self) -> Option<IoStage> {
        match self {
            EditError::Io { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Failure response shape handed back to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<EditErrorKind>,
}

impl From<&EditError> for ErrorResponse {
    fn from(err: &EditError) -> Self {
        Self {
            error_message: err.to_string(),
            error_kind: Some(err.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_phrasing_for_filesystem_kinds() {
        let not_found = EditError::NotFound {
            path: PathBuf::from("/tmp/missing.rs"),
            index: Some(0),
        };
        assert!(not_found.to_string().starts_with("No such file or directory"));
        assert!(not_found.to_string().contains("operation 0"));

        let no_operations = EditError::NotFound {
            path: PathBuf::from("/tmp/missing.rs"),
            index: None,
        };
        assert_eq!(
            no_operations.to_string(),
            "No such file or directory: /tmp/missing.rs"
        );
        assert_eq!(no_operations.operation_index(), None);

        let dir = EditError::FileIsDirectory {
            path: PathBuf::from("/tmp"),
        };
        assert_eq!(dir.to_string(), "Is a directory: /tmp");

        let exists = EditError::AttemptCreateExistingFile {
            path: PathBuf::from("/tmp/a.rs"),
            index: 0,
        };
        assert!(exists.to_string().starts_with("File exists: /tmp/a.rs"));
    }

    #[test]
    fn test_mismatch_message_reports_expected_and_actual() {
        let err = EditError::ExpectedReplacementsMismatch {
            path: PathBuf::from("a.txt"),
            index: 0,
            expected: 2,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("found 3"));
        assert!(msg.contains("a.txt"));
        assert_eq!(err.kind().code(), "EDIT_EXPECTED_OCCURRENCE_MISMATCH");
    }

    #[test]
    fn test_no_occurrence_hint_in_message() {
        let err = EditError::NoOccurrenceFound {
            path: PathBuf::from("lib.rs"),
            index: 1,
            hint: Some(ClosestMatch {
                line: 4,
                text: "    let x = 1;\n".to_string(),
                similarity: 0.9,
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("operation 1"));
        assert!(msg.contains("closest line 4"));
        assert!(msg.contains("let x = 1;"));
    }

    #[test]
    fn test_permission_denied_promoted_from_io() {
        let err = EditError::io(
            "secret.txt",
            IoStage::Read,
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.kind(), EditErrorKind::PermissionDenied);

        let err = EditError::io(
            "dir/x.txt",
            IoStage::Rename,
            io::Error::from(io::ErrorKind::Other),
        );
        assert_eq!(err.kind(), EditErrorKind::IoError);
        assert_eq!(err.io_stage(), Some(IoStage::Rename));
        assert!(err.to_string().starts_with("failed to rename"));
    }

    #[test]
    fn test_error_response_serializes_kind() {
        let err = EditError::Io {
            path: PathBuf::from("x"),
            stage: IoStage::TempCreate,
            source: io::Error::from(io::ErrorKind::Other),
        };
        let json = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(json["error_kind"], "IOError");

        let err = EditError::MultipleMatches {
            path: PathBuf::from("x"),
            index: 2,
            count: 4,
        };
        let json = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(json["error_kind"], "MultipleMatches");
        assert_eq!(err.operation_index(), Some(2));
    }
}
