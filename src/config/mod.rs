pub mod loader;
pub mod schema;

pub use loader::{
    load_from_path, load_from_str, request_from_path, request_from_str, ConfigError,
    RequestFormat,
};
pub use schema::{
    validate_request, EditConfig, EngineSection, ValidationError, ValidationIssue,
    WorkspaceSection, CONFIG_FILE_NAME,
};
