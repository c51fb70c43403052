use super::{parse_input, Tool, ToolContext, ToolError};
use crate::edit::EditResult;
use crate::planner::{EditOperation, EditRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct MultiEditArgs {
    path: PathBuf,
    #[serde(alias = "operations")]
    edits: Vec<EditOperation>,
    #[serde(default)]
    expected_replacements: Option<usize>,
}

/// Ordered list of replacements applied to one file as a single atomic write.
pub struct MultiEditTool {
    context: Arc<ToolContext>,
}

impl MultiEditTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

impl Tool for MultiEditTool {
    fn name(&self) -> &'static str {
        "multi_edit"
    }

    fn description(&self) -> &'static str {
        "Apply several exact-string replacements to one file in order. Each edit sees the \
         result of the previous ones. If any edit fails, the file is left untouched."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["path", "edits"],
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to edit, relative to the workspace root or absolute"
                },
                "edits": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "required": ["old_string", "new_string"],
                        "properties": {
                            "old_string": { "type": "string" },
                            "new_string": { "type": "string" },
                            "replace_all": { "type": "boolean", "default": false },
                            "expected_replacements": { "type": "integer", "minimum": 1 }
                        }
                    }
                },
                "expected_replacements": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Default expectation for edits that do not set their own"
                }
            }
        })
    }

    fn execute(&self, input: &Value) -> Result<EditResult, ToolError> {
        let args: MultiEditArgs = parse_input(self.name(), input)?;
        if args.edits.is_empty() {
            return Err(ToolError::InvalidInput {
                tool: self.name(),
                message: "edits must contain at least one operation".to_string(),
            });
        }

        let mut request = EditRequest::new(args.path, args.edits);
        request.expected_replacements = args.expected_replacements;
        self.context.run(request)
    }
}
