//! Filesystem state as seen by the engine.
//!
//! The engine does no existence or type probing of its own; it consumes a
//! [`FileState`] from a [`FileProbe`]. [`DiskProbe`] is the real
//! implementation, tests can substitute their own.

use crate::errors::{EditError, IoStage};
use std::fs;
use std::io;
use std::path::Path;

/// What currently lives at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Absent,
    Directory,
    File(String),
}

impl FileState {
    pub fn exists(&self) -> bool {
        !matches!(self, FileState::Absent)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FileState::Directory)
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            FileState::File(content) => Some(content),
            _ => None,
        }
    }
}

pub trait FileProbe {
    fn probe(&self, path: &Path) -> Result<FileState, EditError>;
}

/// Reads state straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskProbe;

impl FileProbe for DiskProbe {
    fn probe(&self, path: &Path) -> Result<FileState, EditError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FileState::Absent),
            Err(source) => return Err(EditError::io(path, IoStage::Probe, source)),
        };

        if metadata.is_dir() {
            return Ok(FileState::Directory);
        }

        let bytes = fs::read(path).map_err(|source| EditError::io(path, IoStage::Read, source))?;
        let content = String::from_utf8(bytes).map_err(|e| {
            EditError::io(
                path,
                IoStage::Read,
                io::Error::new(io::ErrorKind::InvalidData, e.utf8_error()),
            )
        })?;

        Ok(FileState::File(content))
    }
}
