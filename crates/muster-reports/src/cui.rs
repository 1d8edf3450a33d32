// crates/muster-reports/src/cui.rs
// ============================================================================
// Module: CUI Marker
// Description: CUI marking configuration and idempotent banner application.
// Purpose: Ensure every emitted document carries top and bottom CUI banners.
// Dependencies: serde, serde_yaml, walkdir
// ============================================================================

//! ## Overview
//! CUI markings are loaded from a YAML (or JSON) config document and fall
//! back to built-in defaults matching `CUI // SP-CTI` with DoD Distribution
//! D boilerplate. Marking is idempotent: a document already containing the
//! configured top banner is left untouched. The presence check is a plain
//! substring match, intentionally coarse and cheap.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Document extensions that receive banner treatment.
const DOCUMENT_EXTENSIONS: [&str; 5] = ["md", "txt", "rst", "adoc", "html"];

/// Default top banner.
const DEFAULT_BANNER: &str = "CUI // SP-CTI";

/// Default multi-line document header.
const DEFAULT_DOCUMENT_HEADER: &str = "\
////////////////////////////////////////////////////////////////////
CONTROLLED UNCLASSIFIED INFORMATION (CUI) // SP-CTI
Distribution: Distribution D -- Authorized DoD Personnel Only
////////////////////////////////////////////////////////////////////";

/// Default multi-line document footer.
const DEFAULT_DOCUMENT_FOOTER: &str = "\
////////////////////////////////////////////////////////////////////
CUI // SP-CTI | Department of Defense
////////////////////////////////////////////////////////////////////";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CUI marking errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CuiError {
    /// File could not be read or written.
    #[error("cui io error: {0}")]
    Io(String),
    /// Target path is not a markable document or directory.
    #[error("cui invalid target: {0}")]
    InvalidTarget(String),
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// CUI marking configuration.
///
/// # Invariants
/// - All fields carry usable values after load; missing keys fall back to
///   the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuiConfig {
    /// Banner placed (and detected) at the top of marked content.
    #[serde(default = "default_banner")]
    pub banner_top: String,
    /// Banner referenced at the bottom of marked content.
    #[serde(default = "default_banner")]
    pub banner_bottom: String,
    /// Multi-line header block for documents.
    #[serde(default = "default_document_header")]
    pub document_header: String,
    /// Multi-line footer block for documents.
    #[serde(default = "default_document_footer")]
    pub document_footer: String,
    /// Optional designation indicator text.
    #[serde(default)]
    pub designation_indicator: Option<String>,
}

/// Returns the default banner string.
fn default_banner() -> String {
    DEFAULT_BANNER.to_string()
}

/// Returns the default document header block.
fn default_document_header() -> String {
    DEFAULT_DOCUMENT_HEADER.to_string()
}

/// Returns the default document footer block.
fn default_document_footer() -> String {
    DEFAULT_DOCUMENT_FOOTER.to_string()
}

impl Default for CuiConfig {
    fn default() -> Self {
        Self {
            banner_top: default_banner(),
            banner_bottom: default_banner(),
            document_header: default_document_header(),
            document_footer: default_document_footer(),
            designation_indicator: None,
        }
    }
}

impl CuiConfig {
    /// Loads the config from a YAML or JSON document file.
    ///
    /// A missing file or unparsable document yields the built-in defaults;
    /// parsed keys override defaults individually.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_yaml::from_str(&text).unwrap_or_default()
    }

    /// Returns true when content already carries the configured top banner.
    #[must_use]
    pub fn is_marked(&self, content: &str) -> bool {
        content.contains(&self.banner_top)
    }

    /// Applies document header and footer unless the content is marked.
    ///
    /// Idempotent: marking already-marked content returns it unchanged.
    #[must_use]
    pub fn apply(&self, content: &str) -> String {
        if self.is_marked(content) {
            return content.to_string();
        }
        format!(
            "{}\n\n{}\n\n{}\n",
            self.document_header.trim(),
            content.trim(),
            self.document_footer.trim()
        )
    }
}

// ============================================================================
// SECTION: File Marking
// ============================================================================

/// Outcome of marking one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkOutcome {
    /// Banners were applied.
    Marked,
    /// File already carried the top banner.
    AlreadyMarked,
    /// File extension is not a document type.
    Skipped,
}

/// Marks one document file in place.
///
/// # Errors
///
/// Returns [`CuiError::Io`] when the file cannot be read or written.
pub fn mark_document(path: &Path, config: &CuiConfig, dry_run: bool) -> Result<MarkOutcome, CuiError> {
    let is_document = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.iter().any(|doc| doc.eq_ignore_ascii_case(ext)));
    if !is_document {
        return Ok(MarkOutcome::Skipped);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|err| CuiError::Io(format!("{}: {err}", path.display())))?;
    if config.is_marked(&content) {
        return Ok(MarkOutcome::AlreadyMarked);
    }
    if !dry_run {
        std::fs::write(path, config.apply(&content))
            .map_err(|err| CuiError::Io(format!("{}: {err}", path.display())))?;
    }
    Ok(MarkOutcome::Marked)
}

/// Summary of a directory marking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkSummary {
    /// Files that received banners.
    pub marked: Vec<PathBuf>,
    /// Files skipped because they were already marked.
    pub already_marked: u64,
    /// Files skipped for unsupported extensions or read errors.
    pub skipped: u64,
}

/// Recursively marks all documents under a directory.
///
/// Hidden and vendored directories are pruned; unreadable files count as
/// skipped rather than failing the run.
///
/// # Errors
///
/// Returns [`CuiError::InvalidTarget`] when the path is not a directory.
pub fn mark_directory(
    root: &Path,
    config: &CuiConfig,
    dry_run: bool,
) -> Result<MarkSummary, CuiError> {
    if !root.is_dir() {
        return Err(CuiError::InvalidTarget(format!("not a directory: {}", root.display())));
    }
    let mut summary = MarkSummary::default();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        !(entry.file_type().is_dir()
            && (name.starts_with('.') && name.len() > 1
                || ["node_modules", "__pycache__", "venv", "env", "target"]
                    .contains(&name.as_ref())))
    }) {
        let Ok(entry) = entry else {
            summary.skipped += 1;
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match mark_document(entry.path(), config, dry_run) {
            Ok(MarkOutcome::Marked) => summary.marked.push(entry.into_path()),
            Ok(MarkOutcome::AlreadyMarked) => summary.already_marked += 1,
            Ok(MarkOutcome::Skipped) | Err(_) => summary.skipped += 1,
        }
    }
    summary.marked.sort();
    Ok(summary)
}

#[cfg(test)]
mod tests;
