//! Agent Edit: atomic multi-step exact-string file editing
//!
//! Applies an ordered list of exact-string replacements to a single text file
//! as one all-or-nothing transaction, and reports the outcome as a unified
//! diff plus replacement counts, or as a typed error.
//!
//! # Architecture
//!
//! Every request is planned entirely in memory first. The [`EditPlanner`]
//! threads a [`WorkingBuffer`] through the operations, so each one sees the
//! output of the ones before it. Only a fully validated plan reaches disk, and
//! it does so through a single atomic replace of the target file.
//!
//! # Safety
//!
//! - No partial commits: any failing operation leaves the file untouched
//! - Atomic file writes (tempfile + fsync + rename)
//! - Workspace boundary enforcement for tool calls
//! - UTF-8 validation of existing content
//! - Typed errors with stable codes
//!
//! # Example
//!
//! ```no_run
//! use agent_edit::{EditEngine, EditOperation, EditRequest, EngineOptions};
//!
//! let engine = EditEngine::new(EngineOptions::default());
//! let request = EditRequest::new(
//!     "src/main.rs",
//!     vec![
//!         EditOperation::new("HELLO", "hello"),
//!         EditOperation::new("world", "there").replace_all(),
//!     ],
//! );
//!
//! match engine.apply(&request) {
//!     Ok(result) => println!("{}\n{}", result.message, result.diff),
//!     Err(e) => eprintln!("{} [{}]", e, e.kind()),
//! }
//! ```

pub mod atomic;
pub mod config;
pub mod diff;
pub mod edit;
pub mod errors;
pub mod planner;
pub mod probe;
pub mod safety;
pub mod tools;
pub mod unescape;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, EditConfig};
pub use edit::{EditEngine, EditResult, EngineOptions, PreparedEdit};
pub use errors::{ClosestMatch, EditError, EditErrorKind, ErrorResponse, IoStage};
pub use planner::{EditOperation, EditPlanner, EditRequest, Plan, PlannerOptions, WorkingBuffer};
pub use probe::{DiskProbe, FileProbe, FileState};
pub use safety::{SafetyError, WorkspaceGuard};
pub use tools::{Tool, ToolContext, ToolError, ToolRegistry};
