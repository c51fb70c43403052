use crate::config::schema::{validate_request, EditConfig, ValidationError};
use crate::planner::EditRequest;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Json { path: None, source } => ConfigError::Json {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(f, "failed to parse TOML ({}): {}", path.display(), source),
                None => write!(f, "failed to parse TOML: {}", source),
            },
            ConfigError::Json { path, source } => match path {
                Some(path) => write!(f, "failed to parse JSON ({}): {}", path.display(), source),
                None => write!(f, "failed to parse JSON: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid input ({}): {}", path.display(), source),
                None => write!(f, "invalid input: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Format of an edit request file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFormat {
    Json,
    Toml,
}

impl RequestFormat {
    /// Pick a format from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => RequestFormat::Toml,
            _ => RequestFormat::Json,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<EditConfig, ConfigError> {
    let config: EditConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditConfig, ConfigError> {
    let path = path.as_ref();
    let contents = read(path)?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

pub fn request_from_str(input: &str, format: RequestFormat) -> Result<EditRequest, ConfigError> {
    let request: EditRequest = match format {
        RequestFormat::Json => serde_json::from_str(input)
            .map_err(|source| ConfigError::Json { path: None, source })?,
        RequestFormat::Toml => toml_edit::de::from_str(input)
            .map_err(|source| ConfigError::Toml { path: None, source })?,
    };
    validate_request(&request)
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(request)
}

pub fn request_from_path(path: impl AsRef<Path>) -> Result<EditRequest, ConfigError> {
    let path = path.as_ref();
    let contents = read(path)?;
    request_from_str(&contents, RequestFormat::from_path(path)).map_err(|error| error.with_path(path))
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
