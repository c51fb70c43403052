//! Unified diff rendering.
//!
//! Output is fully determined by its inputs: no timestamps, no temp paths.

use colored::Colorize;
use similar::TextDiff;
use std::path::Path;

/// Lines of context around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// Header used in place of the old file name when a file is being created.
pub const ABSENT_FILE_HEADER: &str = "/dev/null";

/// Render a unified diff from `old` to `new`.
///
/// `old` is `None` when the file does not exist yet, which renders the old
/// side as [`ABSENT_FILE_HEADER`]. Returns an empty string when nothing
/// changed.
pub fn render(old: Option<&str>, new: &str, path: &Path) -> String {
    let path = path.display().to_string();
    let old_header = if old.is_some() {
        path.as_str()
    } else {
        ABSENT_FILE_HEADER
    };

    TextDiff::from_lines(old.unwrap_or(""), new)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(old_header, &path)
        .to_string()
}

/// Print a rendered diff to stdout with per-line coloring.
pub fn display(diff: &str) {
    for line in diff.lines() {
        let colored_line = if line.starts_with("---") || line.starts_with("+++") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('\\') {
            line.dimmed()
        } else {
            line.normal()
        };
        println!("{}", colored_line);
    }
}
