// crates/muster-frameworks/src/scan.rs
// ============================================================================
// Module: Guarded File Scans
// Description: Total file-walk and read helpers for automated checks.
// Purpose: Walk project trees without following symlinks or failing on I/O.
// Dependencies: walkdir
// ============================================================================

//! ## Overview
//! Automated checks are total over their input: unreadable files are
//! skipped, symlinks are never followed, and common vendored or generated
//! directories are pruned. Every helper here returns best-effort data and
//! never raises on malformed content.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Directory names pruned from every scan.
const PRUNED_DIRS: [&str; 8] = [
    "node_modules",
    "__pycache__",
    ".git",
    "venv",
    "env",
    ".tox",
    ".tmp",
    "target",
];

/// Upper bound on files visited per scan to keep handlers bounded.
const MAX_SCAN_FILES: usize = 10_000;

// ============================================================================
// SECTION: Functions
// ============================================================================

/// Returns true when a directory entry should be pruned from scans.
fn is_pruned(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if entry.file_type().is_dir()
        && (name.starts_with('.') && name.len() > 1 || PRUNED_DIRS.contains(&name.as_ref()))
    {
        return true;
    }
    false
}

/// Walks a project tree collecting files with any of the given extensions.
///
/// Hidden and vendored directories are pruned, symlinks are not followed,
/// and the walk stops after a bounded number of files.
#[must_use]
pub fn files_with_extensions(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|entry| !is_pruned(entry)) {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(entry.into_path());
            if files.len() >= MAX_SCAN_FILES {
                break;
            }
        }
    }
    files.sort();
    files
}

/// Reads a file as lossy UTF-8, lowercased for keyword scans.
///
/// Returns `None` when the file cannot be read; callers treat that as "no
/// signal detected".
#[must_use]
pub fn read_lowercase(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|bytes| String::from_utf8_lossy(&bytes).to_lowercase())
}

/// Reads a file as lossy UTF-8 preserving case.
#[must_use]
pub fn read_text(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
