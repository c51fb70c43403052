use crate::atomic;
use crate::diff;
use crate::errors::{EditError, IoStage};
use crate::planner::{EditPlanner, EditRequest, Plan, PlannerOptions};
use crate::probe::{DiskProbe, FileProbe};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Engine behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub planner: PlannerOptions,
    /// Create missing parent directories when a request creates a file
    pub create_parent_dirs: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            planner: PlannerOptions::default(),
            create_parent_dirs: true,
        }
    }
}

/// Success response for an edit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use = "EditResult carries the diff and replacement counts"]
pub struct EditResult {
    pub message: String,
    pub actual_replacements: usize,
    pub diff: String,
    pub per_operation_replacements: Vec<usize>,
    pub created: bool,
    /// Nothing was written because the request was only previewed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    #[serde(skip)]
    pub path: PathBuf,
}

/// A fully validated request that has not been written yet.
#[derive(Debug, Clone)]
#[must_use = "PreparedEdit does nothing until commit() is called"]
pub struct PreparedEdit {
    path: PathBuf,
    plan: Plan,
    diff: String,
    changed: bool,
}

impl PreparedEdit {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn diff(&self) -> &str {
        &self.diff
    }

    /// Whether committing would change bytes on disk.
    pub fn changes_disk(&self) -> bool {
        self.changed
    }

    fn result(&self, dry_run: bool) -> EditResult {
        let replacements = self.plan.total_replacements();
        let path = self.path.display();
        let message = match (self.plan.created, dry_run) {
            (true, false) if replacements == 0 => {
                format!("Created new file: {path} with provided content.")
            }
            (true, false) => format!(
                "Created new file: {path} ({replacements} replacement(s) applied after creation)."
            ),
            (true, true) => format!("Dry run: would create new file: {path}."),
            (false, _) if !self.changed && replacements > 0 => format!(
                "No changes applied to {path}: the {replacements} replacement(s) cancelled each other out."
            ),
            (false, _) if !self.changed => format!("No changes applied to {path}."),
            (false, false) => {
                format!("Successfully modified file: {path} ({replacements} replacement(s)).")
            }
            (false, true) => {
                format!("Dry run: would modify file: {path} ({replacements} replacement(s)).")
            }
        };

        EditResult {
            message,
            actual_replacements: replacements,
            diff: self.diff.clone(),
            per_operation_replacements: self.plan.per_operation(),
            created: self.plan.created,
            dry_run,
            path: self.path.clone(),
        }
    }
}

/// Runs requests end to end: probe, plan, diff, commit.
///
/// The engine keeps no per-request state. It assumes a single writer per path
/// for the duration of a call; concurrent requests against the same path are
/// not coordinated.
#[derive(Debug, Clone)]
pub struct EditEngine<P: FileProbe = DiskProbe> {
    planner: EditPlanner,
    probe: P,
    create_parent_dirs: bool,
}

impl EditEngine<DiskProbe> {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_probe(DiskProbe, options)
    }
}

impl<P: FileProbe> EditEngine<P> {
    pub fn with_probe(probe: P, options: EngineOptions) -> Self {
        Self {
            planner: EditPlanner::new(options.planner),
            probe,
            create_parent_dirs: options.create_parent_dirs,
        }
    }

    /// Validate `request` and render its diff without writing anything.
    pub fn prepare(&self, request: &EditRequest) -> Result<PreparedEdit, EditError> {
        let path = request.path.clone();
        log::debug!(
            "planning {} operation(s) against {}",
            request.operations.len(),
            path.display()
        );

        let state = self.probe.probe(&path)?;
        let current = state.content();
        let plan = self
            .planner
            .plan(request, current, state.is_directory())
            .inspect_err(|e| log::debug!("plan rejected: {e}"))?;

        let changed = plan.created || current != Some(plan.content.as_str());
        let diff = diff::render(current, &plan.content, &path);

        Ok(PreparedEdit {
            path,
            plan,
            diff,
            changed,
        })
    }

    /// Validate `request` and report what it would do.
    pub fn preview(&self, request: &EditRequest) -> Result<EditResult, EditError> {
        Ok(self.prepare(request)?.result(true))
    }

    /// Validate `request` and commit it with a single atomic write.
    pub fn apply(&self, request: &EditRequest) -> Result<EditResult, EditError> {
        let prepared = self.prepare(request)?;
        self.commit(&prepared)?;
        let result = prepared.result(false);
        log::info!("{}", result.message);
        Ok(result)
    }

    /// Write a prepared edit to disk.
    pub fn commit(&self, prepared: &PreparedEdit) -> Result<(), EditError> {
        if !prepared.changed {
            return Ok(());
        }

        if prepared.plan.created && self.create_parent_dirs {
            create_missing_parent(&prepared.path)?;
        }

        atomic::commit(&prepared.path, prepared.plan.content.as_bytes())
    }
}

fn create_missing_parent(path: &Path) -> Result<(), EditError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            log::debug!("creating parent directory {}", parent.display());
            fs::create_dir_all(parent)
                .map_err(|source| EditError::io(path, IoStage::CreateParent, source))
        }
        _ => Ok(()),
    }
}
