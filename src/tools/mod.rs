//! Tool-call surface over the edit engine.
//!
//! Each [`Tool`] parses a JSON input, resolves its path through the
//! [`WorkspaceGuard`] and hands an [`EditRequest`] to the engine. The
//! [`ToolRegistry`] is the lookup table callers dispatch through; its
//! [`dispatch`](ToolRegistry::dispatch) method always answers with JSON, either
//! the success shape (`message`, `actual_replacements`, `diff`, ...) or an
//! [`ErrorResponse`].

mod edit_file;
mod multi_edit;

use crate::edit::{EditEngine, EditResult};
use crate::errors::{EditError, EditErrorKind, ErrorResponse};
use crate::planner::EditRequest;
use crate::safety::{SafetyError, WorkspaceGuard};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub use edit_file::EditFileTool;
pub use multi_edit::MultiEditTool;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid input for {tool}: {message}")]
    InvalidInput { tool: &'static str, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl ToolError {
    /// Error kind reported to callers; `None` for failures outside the taxonomy.
    pub fn kind(&self) -> Option<EditErrorKind> {
        match self {
            ToolError::Edit(e) => Some(e.kind()),
            ToolError::Safety(SafetyError::Canonicalize(_)) => Some(EditErrorKind::IoError),
            ToolError::Safety(SafetyError::EmptyPath) => None,
            ToolError::Safety(_) => Some(EditErrorKind::PermissionDenied),
            ToolError::InvalidInput { .. } | ToolError::UnknownTool(_) => None,
        }
    }
}

impl From<&ToolError> for ErrorResponse {
    fn from(err: &ToolError) -> Self {
        match err {
            ToolError::Edit(e) => ErrorResponse::from(e),
            other => Self {
                error_message: other.to_string(),
                error_kind: other.kind(),
            },
        }
    }
}

/// State shared by every tool: where paths may point and how edits run.
#[derive(Debug)]
pub struct ToolContext {
    pub guard: WorkspaceGuard,
    pub engine: EditEngine,
    /// Report what would change without writing
    pub dry_run: bool,
}

impl ToolContext {
    pub fn new(guard: WorkspaceGuard, engine: EditEngine) -> Self {
        Self {
            guard,
            engine,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolve the request path and run it through the engine.
    pub fn run(&self, mut request: EditRequest) -> Result<EditResult, ToolError> {
        request.path = self.guard.resolve(&request.path)?;
        let result = if self.dry_run {
            self.engine.preview(&request)?
        } else {
            self.engine.apply(&request)?
        };
        Ok(result)
    }
}

/// A named capability callers invoke with a JSON input.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the accepted input.
    fn input_schema(&self) -> Value;
    fn execute(&self, input: &Value) -> Result<EditResult, ToolError>;
}

/// Parse a tool input into its typed argument struct.
pub(crate) fn parse_input<T: serde::de::DeserializeOwned>(
    tool: &'static str,
    input: &Value,
) -> Result<T, ToolError> {
    T::deserialize(input).map_err(|e| ToolError::InvalidInput {
        tool,
        message: e.to_string(),
    })
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `edit_file` and `multi_edit` over one shared context.
    pub fn with_defaults(context: ToolContext) -> Self {
        let context = Arc::new(context);
        let mut registry = Self::new();
        registry.register(Box::new(EditFileTool::new(Arc::clone(&context))));
        registry.register(Box::new(MultiEditTool::new(context)));
        registry
    }

    /// Add `tool`, replacing any tool registered under the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if self.tools.insert(tool.name(), tool).is_some() {
            log::warn!("replaced an already registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    /// Registered tool names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn execute(&self, name: &str, input: &Value) -> Result<EditResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        log::debug!("executing tool {name}");
        tool.execute(input)
    }

    /// Run `name` and render the outcome as a JSON response.
    pub fn dispatch(&self, name: &str, input: &Value) -> Value {
        match self.execute(name, input) {
            Ok(result) => json!(result),
            Err(e) => {
                log::debug!("tool {name} failed: {e}");
                json!(ErrorResponse::from(&e))
            }
        }
    }

    /// Name, description and input schema of every registered tool.
    pub fn definitions(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "input_schema": tool.input_schema(),
                })
            })
            .collect()
    }
}
