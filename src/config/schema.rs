use crate::edit::EngineOptions;
use crate::planner::{EditRequest, PlannerOptions};
use crate::safety::{SafetyError, WorkspaceGuard};
use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// File name looked up in the workspace root when no config path is given.
pub const CONFIG_FILE_NAME: &str = "agent-edit.toml";

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub workspace: WorkspaceSection,
}

impl EditConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for entry in &self.workspace.forbidden {
            if entry.as_os_str().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "workspace.forbidden[]",
                });
                continue;
            }
            if entry.is_absolute() {
                issues.push(ValidationIssue::InvalidForbiddenEntry {
                    entry: entry.clone(),
                    message: "must be relative to the workspace root",
                });
            }
            if entry.components().any(|c| c == Component::ParentDir) {
                issues.push(ValidationIssue::InvalidForbiddenEntry {
                    entry: entry.clone(),
                    message: "must not contain '..'",
                });
            }
        }

        if let Some(root) = &self.workspace.root {
            if root.as_os_str().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "workspace.root",
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            planner: PlannerOptions {
                unescape_fallback: self.engine.unescape_fallback,
            },
            create_parent_dirs: self.engine.create_parent_dirs,
        }
    }

    /// Build the path guard for `workspace_root`.
    pub fn guard(&self, workspace_root: &Path) -> Result<WorkspaceGuard, SafetyError> {
        WorkspaceGuard::new(
            workspace_root,
            &self.workspace.forbidden,
            self.workspace.enforce_boundary,
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSection {
    #[serde(default = "default_true")]
    pub create_parent_dirs: bool,
    #[serde(default)]
    pub unescape_fallback: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            create_parent_dirs: true,
            unescape_fallback: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceSection {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_forbidden")]
    pub forbidden: Vec<PathBuf>,
    #[serde(default = "default_true")]
    pub enforce_boundary: bool,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            root: None,
            forbidden: default_forbidden(),
            enforce_boundary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_forbidden() -> Vec<PathBuf> {
    vec![PathBuf::from(".git")]
}

/// Structural checks on a request loaded from a file.
pub fn validate_request(request: &EditRequest) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    if request.path.as_os_str().is_empty() {
        issues.push(ValidationIssue::MissingField { field: "path" });
    }
    if request.operations.is_empty() {
        issues.push(ValidationIssue::EmptyOperationList);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyOperationList,
    MissingField {
        field: &'static str,
    },
    InvalidForbiddenEntry {
        entry: PathBuf,
        message: &'static str,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyOperationList => write!(f, "edit request contains no operations"),
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::InvalidForbiddenEntry { entry, message } => {
                write!(f, "forbidden path '{}' {message}", entry.display())
            }
        }
    }
}
