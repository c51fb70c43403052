use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Resolves tool paths against a workspace root and refuses edits outside it.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonical workspace root
    workspace_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
    /// Reject resolved paths that leave the workspace root
    enforce_boundary: bool,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error(
        "Path is outside workspace: {} (workspace: {})",
        .path.display(),
        .workspace.display()
    )]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error(
        "Path is in forbidden directory: {} (forbidden: {})",
        .path.display(),
        .forbidden.display()
    )]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Path escapes through '..' below a missing directory: {}", .0.display())]
    UnresolvableParent(PathBuf),

    #[error("Empty path")]
    EmptyPath,

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl WorkspaceGuard {
    /// Create a guard rooted at `workspace_root`.
    ///
    /// `forbidden` entries are workspace-relative. Cargo's registry and git
    /// checkouts under the home directory are always forbidden.
    pub fn new(
        workspace_root: impl AsRef<Path>,
        forbidden: &[PathBuf],
        enforce_boundary: bool,
    ) -> Result<Self, SafetyError> {
        let workspace_root = workspace_root.as_ref().canonicalize()?;

        let mut forbidden_paths = Vec::new();

        if let Some(home) = home::home_dir() {
            for dir in [".cargo/registry", ".cargo/git"] {
                if let Ok(path) = home.join(dir).canonicalize() {
                    forbidden_paths.push(path);
                }
            }
        }

        for entry in forbidden {
            let joined = workspace_root.join(entry);
            // A forbidden directory that does not exist yet still guards its name.
            forbidden_paths.push(joined.canonicalize().unwrap_or(joined));
        }

        Ok(Self {
            workspace_root,
            forbidden_paths,
            enforce_boundary,
        })
    }

    /// Resolve `path` to an absolute path and check it is safe to edit.
    ///
    /// The target does not need to exist: the deepest existing ancestor is
    /// canonicalized (resolving symlinks) and the remaining components are
    /// appended unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SafetyError::EmptyPath);
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        let resolved = canonicalize_partial(&absolute)?;
        self.check_resolved(&resolved)?;

        Ok(resolved)
    }

    fn check_resolved(&self, resolved: &Path) -> Result<(), SafetyError> {
        if self.enforce_boundary && !resolved.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: resolved.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if resolved.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: resolved.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}

/// Canonicalize the longest existing prefix of `path` and re-attach the rest.
fn canonicalize_partial(path: &Path) -> Result<PathBuf, SafetyError> {
    let mut missing: Vec<OsString> = Vec::new();
    let mut existing = path;

    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                let mut resolved = canonical;
                for part in missing.iter().rev() {
                    resolved.push(part);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // `file_name` is None for a trailing `..`, which cannot be
                // resolved lexically once the directory before it is missing.
                let Some(name) = existing.file_name() else {
                    if existing.components().next_back() == Some(Component::ParentDir) {
                        return Err(SafetyError::UnresolvableParent(path.to_path_buf()));
                    }
                    return Err(SafetyError::Canonicalize(e));
                };
                missing.push(name.to_os_string());
                existing = match existing.parent() {
                    Some(parent) => parent,
                    None => return Err(SafetyError::Canonicalize(e)),
                };
            }
            Err(e) => return Err(SafetyError::Canonicalize(e)),
        }
    }
}
