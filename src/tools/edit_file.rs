use super::{parse_input, Tool, ToolContext, ToolError};
use crate::edit::EditResult;
use crate::planner::{EditOperation, EditRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct EditFileArgs {
    path: PathBuf,
    old_string: String,
    new_string: String,
    #[serde(default)]
    replace_all: bool,
    #[serde(default)]
    expected_replacements: Option<usize>,
}

/// Single exact-string replacement, or file creation with an empty `old_string`.
pub struct EditFileTool {
    context: Arc<ToolContext>,
}

impl EditFileTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

impl Tool for EditFileTool {
    fn name(&self) -> &'static str {
        "edit_file"
    }

    fn description(&self) -> &'static str {
        "Replace an exact string in a file. old_string must occur exactly once unless \
         replace_all or expected_replacements is given. An empty old_string creates a new \
         file holding new_string."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["path", "old_string", "new_string"],
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to edit, relative to the workspace root or absolute"
                },
                "old_string": {
                    "type": "string",
                    "description": "Exact text to replace; empty to create the file"
                },
                "new_string": {
                    "type": "string",
                    "description": "Replacement text"
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace every occurrence",
                    "default": false
                },
                "expected_replacements": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Exact number of occurrences that must match"
                }
            }
        })
    }

    fn execute(&self, input: &Value) -> Result<EditResult, ToolError> {
        let args: EditFileArgs = parse_input(self.name(), input)?;
        let operation = EditOperation {
            old_string: args.old_string,
            new_string: args.new_string,
            replace_all: args.replace_all,
            expected_replacements: args.expected_replacements,
        };
        self.context.run(EditRequest::single(args.path, operation))
    }
}
