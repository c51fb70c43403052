//! Engine-level integration tests against a real temporary filesystem.

mod atomicity;
mod engine_properties;

use std::fs;
use std::path::Path;

/// Entries left in `dir`, sorted, to catch stray temp files.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
