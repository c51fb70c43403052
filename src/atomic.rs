//! Crash-safe file commits: tempfile + fsync + rename.
//!
//! The target path is only ever touched by the final rename, so a failure at
//! any earlier step leaves a pre-existing file byte-for-byte intact. The
//! temporary file is created in the target's own directory so the rename
//! never crosses a filesystem boundary.
//!
//! Parent directories are not created here; callers that create nested new
//! files make them first.

use crate::errors::{EditError, IoStage};
use std::fs;
use std::io::Write;
use std::path::Path;

const TEMP_PREFIX: &str = ".agent-edit-";
const TEMP_SUFFIX: &str = ".tmp";

/// Atomically replace (or create) `path` with `content`.
pub fn commit(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    // Carry the existing file's mode over; the temp file starts out 0600.
    let existing_permissions = fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|source| EditError::io(path, IoStage::TempCreate, source))?;

    temp.write_all(content)
        .map_err(|source| EditError::io(path, IoStage::TempWrite, source))?;

    // Mode is set before the flush.
    let permissions_set = match existing_permissions {
        Some(permissions) => temp.as_file().set_permissions(permissions),
        None => set_new_file_permissions(temp.as_file()),
    };
    permissions_set.map_err(|source| EditError::io(path, IoStage::TempWrite, source))?;

    temp.as_file()
        .sync_all()
        .map_err(|source| EditError::io(path, IoStage::TempWrite, source))?;

    // Dropping `temp` on any error above removes it from disk.
    temp.persist(path)
        .map_err(|e| EditError::io(path, IoStage::Rename, e.error))?;

    log::debug!("committed {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(unix)]
fn set_new_file_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_file_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
