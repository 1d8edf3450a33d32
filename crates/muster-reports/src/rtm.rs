// crates/muster-reports/src/rtm.rs
// ============================================================================
// Module: Requirements Traceability Matrix
// Description: Bidirectional RTM built from project files by fuzzy matching.
// Purpose: Link requirements to design, code, and tests; surface gaps.
// Dependencies: muster-core, regex, serde, serde_json, walkdir
// ============================================================================

//! ## Overview
//! The RTM builder discovers four disjoint artifact sets (requirements,
//! design documents, code modules, test files), assigns synthetic ids
//! (`REQ-###`, `DES-###`, `MOD-###`, `TST-###`), and links them with a
//! keyword-overlap match (Jaccard similarity over stop-word-filtered
//! tokens, threshold 0.15). Forward traces classify each requirement as
//! Traced, Partial, or Gap; backward traces flag orphan tests. Outputs are
//! a CUI-marked Markdown report and a machine-readable JSON file under
//! `compliance/rtm/`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::ProjectId;
use muster_core::StoreError;
use muster_core::Timestamp;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::cui::CuiConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum keyword overlap to count as a match.
const MATCH_THRESHOLD: f64 = 0.15;

/// Stop words filtered out of keyword extraction.
const STOP_WORDS: [&str; 59] = [
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "shall", "should", "may", "might", "must", "can", "could",
    "would", "and", "but", "or", "nor", "not", "so", "yet", "for", "of", "in", "on", "at", "to",
    "from", "by", "with", "as", "into", "through", "during", "before", "after", "above", "below",
    "between", "under", "over", "test", "tests", "spec", "src", "lib", "app", "module",
];

/// Headings skipped during markdown requirement discovery.
const GENERIC_HEADINGS: [&str; 8] = [
    "overview",
    "introduction",
    "references",
    "table of contents",
    "toc",
    "changelog",
    "appendix",
    "glossary",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// RTM generation errors.
#[derive(Debug, Error)]
pub enum RtmError {
    /// Project does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Project has no usable directory to scan.
    #[error("rtm invalid target: {0}")]
    InvalidTarget(String),
    /// Storage failure.
    #[error("store error: {0}")]
    Store(StoreError),
    /// Output file I/O failure.
    #[error("rtm io error: {0}")]
    Io(String),
}

impl From<StoreError> for RtmError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => Self::NotFound(message),
            other => Self::Store(other),
        }
    }
}

// ============================================================================
// SECTION: Artifact Types
// ============================================================================

/// One discovered artifact (requirement, design doc, module, or test).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Synthetic identifier (`REQ-001`, `DES-001`, ...).
    pub id: String,
    /// Artifact title or module name.
    pub title: String,
    /// Path relative to the project directory.
    pub file_path: String,
    /// Artifact kind label (feature, markdown, adr, unit, ...).
    pub kind: String,
}

/// One fuzzy-match reference with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRef {
    /// Matched artifact identifier.
    pub id: String,
    /// Matched artifact title.
    pub title: String,
    /// Matched artifact path.
    pub file_path: String,
    /// Keyword overlap rounded to two decimals.
    pub confidence: f64,
}

/// Forward trace entry for one requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardTrace {
    /// Requirement identifier.
    pub requirement_id: String,
    /// Requirement title.
    pub requirement_title: String,
    /// Requirement source file.
    pub source_file: String,
    /// Matched design artifacts.
    pub design_artifacts: Vec<MatchRef>,
    /// Matched code modules.
    pub code_modules: Vec<MatchRef>,
    /// Matched test files.
    pub test_files: Vec<MatchRef>,
    /// Trace status: `Traced`, `Partial`, or `Gap`.
    pub status: String,
}

/// Backward trace entry for one test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackwardTrace {
    /// Test identifier.
    pub test_id: String,
    /// Test name.
    pub test_name: String,
    /// Test file path.
    pub test_file: String,
    /// Test type label.
    pub test_type: String,
    /// Matched requirements.
    pub matched_requirements: Vec<MatchRef>,
    /// Trace status: `Traced` or `Orphan`.
    pub status: String,
}

/// Result of one RTM generation run.
#[derive(Debug, Clone, Serialize)]
pub struct RtmOutput {
    /// Outcome label (`success`).
    pub status: String,
    /// Written Markdown report path.
    pub report_file: PathBuf,
    /// Written JSON data path.
    pub data_file: PathBuf,
    /// Forward coverage percentage (one decimal place).
    pub coverage: f64,
    /// Requirements with at least one matched test.
    pub traced_count: u64,
    /// Total discovered requirements.
    pub total_requirements: u64,
    /// Forward trace entries.
    pub forward: Vec<ForwardTrace>,
    /// Backward trace entries.
    pub backward: Vec<BackwardTrace>,
    /// Count of untested requirements plus orphan tests.
    pub gap_count: u64,
    /// Non-fatal warnings surfaced to the caller's diagnostics stream.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Keywords
// ============================================================================

/// Normalizes a name: lowercase, extension stripped, separators to spaces.
fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = Regex::new(r"\.(py|js|ts|tsx|jsx|rs|go|java|feature|md|yaml|yml|json)$")
        .ok()
        .map_or_else(|| lower.clone(), |re| re.replace(&lower, "").into_owned());
    stripped
        .chars()
        .map(|c| if matches!(c, '-' | '_' | '.' | '/' | '\\') { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Extracts matchable keywords from a text string.
fn keywords(text: &str) -> BTreeSet<String> {
    normalize(text)
        .split_whitespace()
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .map(ToString::to_string)
        .collect()
}

/// Jaccard-style keyword overlap in `[0, 1]`.
#[allow(
    clippy::cast_precision_loss,
    reason = "Keyword counts are far below the f64 integer precision bound."
)]
fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 { 0.0 } else { intersection as f64 / union as f64 }
}

/// Rounds a confidence to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Combined keywords of an artifact's title and path.
fn artifact_keywords(artifact: &Artifact) -> BTreeSet<String> {
    let mut set = keywords(&artifact.title);
    set.extend(keywords(&artifact.file_path));
    set
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Collects sorted files under a directory matching a predicate.
fn collect_files(root: &Path, predicate: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(false).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let display = path.display().to_string();
        if display.contains("node_modules") || display.contains("__pycache__") {
            continue;
        }
        if predicate(&path) {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Discovers requirements from `.feature` files and requirement markdown.
fn discover_requirements(project_dir: &Path) -> Vec<Artifact> {
    let mut requirements = Vec::new();
    let mut counter = 1usize;
    let feature_line = Regex::new(r"(?m)^\s*Feature:\s*(.+)$").ok();

    for path in collect_files(project_dir, |p| {
        p.extension().and_then(|e| e.to_str()) == Some("feature")
    }) {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let title = feature_line
            .as_ref()
            .and_then(|re| re.captures(&content))
            .and_then(|captures| captures.get(1))
            .map_or_else(
                || title_from_stem(&path),
                |capture| capture.as_str().trim().to_string(),
            );
        requirements.push(Artifact {
            id: format!("REQ-{counter:03}"),
            title,
            file_path: relative_display(&path, project_dir),
            kind: "feature".to_string(),
        });
        counter += 1;
    }

    let requirement_files = [
        "requirements.md",
        "REQUIREMENTS.md",
        "user-stories.md",
        "user_stories.md",
        "USER_STORIES.md",
        "docs/requirements.md",
        "docs/user-stories.md",
    ];
    let mut candidates: Vec<PathBuf> = requirement_files
        .iter()
        .map(|name| project_dir.join(name))
        .filter(|path| path.is_file())
        .collect();
    let nested = project_dir.join("docs/requirements");
    if nested.is_dir() {
        candidates.extend(collect_files(&nested, |p| {
            p.extension().and_then(|e| e.to_str()) == Some("md")
        }));
    }
    candidates.sort();
    candidates.dedup();

    let heading = Regex::new(r"(?m)^#{2,4}\s+(.+)$").ok();
    for path in candidates {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        if let Some(heading) = heading.as_ref() {
            for captures in heading.captures_iter(&content) {
                let Some(capture) = captures.get(1) else {
                    continue;
                };
                let title = capture.as_str().trim().to_string();
                if GENERIC_HEADINGS.contains(&title.to_lowercase().as_str()) {
                    continue;
                }
                requirements.push(Artifact {
                    id: format!("REQ-{counter:03}"),
                    title,
                    file_path: relative_display(&path, project_dir),
                    kind: "markdown".to_string(),
                });
                counter += 1;
            }
        }
    }
    requirements
}

/// Discovers design artifacts from known files and design directories.
fn discover_design(project_dir: &Path) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    let mut counter = 1usize;
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();

    let design_files = [
        "architecture.md",
        "ARCHITECTURE.md",
        "system_design.md",
        "design.md",
        "DESIGN.md",
        "docs/architecture.md",
        "docs/design.md",
        "docs/system_design.md",
    ];
    for name in design_files {
        let path = project_dir.join(name);
        if path.is_file() && seen.insert(path.clone()) {
            artifacts.push(Artifact {
                id: format!("DES-{counter:03}"),
                title: title_from_stem(&path),
                file_path: relative_display(&path, project_dir),
                kind: "document".to_string(),
            });
            counter += 1;
        }
    }

    let design_dirs =
        ["docs/design", "docs/architecture", "design", "architecture", "adr", "docs/adr"];
    for dir_name in design_dirs {
        let dir = project_dir.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for path in
            collect_files(&dir, |p| p.extension().and_then(|e| e.to_str()) == Some("md"))
        {
            if !seen.insert(path.clone()) {
                continue;
            }
            let kind = if dir_name.contains("adr") { "adr" } else { "design" };
            artifacts.push(Artifact {
                id: format!("DES-{counter:03}"),
                title: title_from_stem(&path),
                file_path: relative_display(&path, project_dir),
                kind: kind.to_string(),
            });
            counter += 1;
        }
    }
    artifacts
}

/// Discovers code modules under source directories and the project root.
fn discover_code(project_dir: &Path) -> Vec<Artifact> {
    let mut modules = Vec::new();
    let mut counter = 1usize;
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
    let source_dirs = ["src", "lib", "app", "api", "services", "models"];
    let extensions = ["py", "js", "ts", "tsx", "jsx", "go", "rs", "java"];

    for dir_name in source_dirs {
        let dir = project_dir.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for path in collect_files(&dir, |p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        }) {
            if is_test_file_name(&path) || !seen.insert(path.clone()) {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some("__init__.py")
                && std::fs::metadata(&path).map(|meta| meta.len() < 50).unwrap_or(true)
            {
                continue;
            }
            modules.push(Artifact {
                id: format!("MOD-{counter:03}"),
                title: stem_of(&path),
                file_path: relative_display(&path, project_dir),
                kind: language_of(&path).to_string(),
            });
            counter += 1;
        }
    }

    let root_apps = [
        "main.py", "app.py", "server.py", "index.py", "main.js", "app.js", "server.js",
        "index.js", "main.ts", "app.ts", "server.ts", "index.ts", "main.rs",
    ];
    for name in root_apps {
        let path = project_dir.join(name);
        if path.is_file() && seen.insert(path.clone()) {
            modules.push(Artifact {
                id: format!("MOD-{counter:03}"),
                title: stem_of(&path),
                file_path: relative_display(&path, project_dir),
                kind: language_of(&path).to_string(),
            });
            counter += 1;
        }
    }
    modules
}

/// Discovers test files under test directories and the project root.
fn discover_tests(project_dir: &Path) -> Vec<Artifact> {
    let mut tests = Vec::new();
    let mut counter = 1usize;
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
    let test_dirs = ["tests", "test", "spec", "specs", "e2e", "integration"];

    let push = |path: PathBuf, kind: String, tests: &mut Vec<Artifact>, counter: &mut usize| {
        tests.push(Artifact {
            id: format!("TST-{counter:03}"),
            title: stem_of(&path),
            file_path: relative_display(&path, project_dir),
            kind,
        });
        *counter += 1;
    };

    for dir_name in test_dirs {
        let dir = project_dir.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for path in collect_files(&dir, |p| is_test_file_name(p)) {
            if !seen.insert(path.clone()) {
                continue;
            }
            let rel = relative_display(&path, project_dir).to_lowercase();
            let kind = if rel.contains("e2e") {
                "e2e"
            } else if rel.contains("integration") {
                "integration"
            } else if rel.contains("unit") {
                "unit"
            } else if rel.contains("spec") {
                "spec"
            } else {
                "unit"
            };
            push(path, kind.to_string(), &mut tests, &mut counter);
        }
    }

    // Root-level test files.
    for path in collect_files(project_dir, |p| {
        p.parent() == Some(project_dir) && is_test_file_name(p)
    }) {
        if seen.insert(path.clone()) {
            push(path, "unit".to_string(), &mut tests, &mut counter);
        }
    }

    // Behave-style step definitions.
    for dir_name in ["features/steps", "features", "steps"] {
        let dir = project_dir.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for path in collect_files(&dir, |p| {
            p.extension().and_then(|e| e.to_str()) == Some("py")
                && !p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with("__"))
        }) {
            if seen.insert(path.clone()) {
                push(path, "bdd_step".to_string(), &mut tests, &mut counter);
            }
        }
    }
    tests
}

/// Returns true for file names matching common test patterns.
fn is_test_file_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_lowercase();
    lower.starts_with("test_") && lower.ends_with(".py")
        || lower.ends_with("_test.py")
        || lower.ends_with("_test.go")
        || lower.ends_with(".test.js")
        || lower.ends_with(".test.ts")
        || lower.ends_with(".test.tsx")
        || lower.ends_with(".test.jsx")
        || lower.ends_with(".spec.js")
        || lower.ends_with(".spec.ts")
        || lower.ends_with(".spec.tsx")
        || lower.ends_with(".spec.jsx")
        || (name.starts_with("Test") && name.ends_with(".java"))
        || name.ends_with("Test.java")
}

/// Renders a path relative to the project directory.
fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Returns the file stem as an owned string.
fn stem_of(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Title-cases a file stem for display.
fn title_from_stem(path: &Path) -> String {
    stem_of(path)
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Maps a source extension to a language label.
fn language_of(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py") => "python",
        Some("js" | "jsx") => "javascript",
        Some("ts" | "tsx") => "typescript",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("java") => "java",
        _ => "unknown",
    }
}

// ============================================================================
// SECTION: Tracing
// ============================================================================

/// Matches a keyword set against artifacts, returning refs over threshold.
fn match_artifacts(source: &BTreeSet<String>, targets: &[Artifact]) -> Vec<MatchRef> {
    targets
        .iter()
        .filter_map(|target| {
            let score = overlap(source, &artifact_keywords(target));
            (score >= MATCH_THRESHOLD).then(|| MatchRef {
                id: target.id.clone(),
                title: target.title.clone(),
                file_path: target.file_path.clone(),
                confidence: round2(score),
            })
        })
        .collect()
}

/// Builds the forward trace from requirements to design/code/tests.
fn build_forward(
    requirements: &[Artifact],
    design: &[Artifact],
    code: &[Artifact],
    tests: &[Artifact],
) -> Vec<ForwardTrace> {
    requirements
        .iter()
        .map(|requirement| {
            let source = artifact_keywords(requirement);
            let design_artifacts = match_artifacts(&source, design);
            let code_modules = match_artifacts(&source, code);
            let test_files = match_artifacts(&source, tests);
            let status = if !design_artifacts.is_empty()
                && !code_modules.is_empty()
                && !test_files.is_empty()
            {
                "Traced"
            } else if !test_files.is_empty() || !design_artifacts.is_empty()
                || !code_modules.is_empty()
            {
                "Partial"
            } else {
                "Gap"
            };
            ForwardTrace {
                requirement_id: requirement.id.clone(),
                requirement_title: requirement.title.clone(),
                source_file: requirement.file_path.clone(),
                design_artifacts,
                code_modules,
                test_files,
                status: status.to_string(),
            }
        })
        .collect()
}

/// Builds the backward trace from tests to requirements.
fn build_backward(tests: &[Artifact], requirements: &[Artifact]) -> Vec<BackwardTrace> {
    tests
        .iter()
        .map(|test| {
            let source = artifact_keywords(test);
            let matched_requirements = match_artifacts(&source, requirements);
            let status = if matched_requirements.is_empty() { "Orphan" } else { "Traced" };
            BackwardTrace {
                test_id: test.id.clone(),
                test_name: test.title.clone(),
                test_file: test.file_path.clone(),
                test_type: test.kind.clone(),
                matched_requirements,
                status: status.to_string(),
            }
        })
        .collect()
}

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// Builds the RTM for a project and writes both output files.
///
/// # Errors
///
/// Returns [`RtmError::NotFound`] when the project does not exist,
/// [`RtmError::InvalidTarget`] when it has no usable directory, and
/// [`RtmError::Io`]/[`RtmError::Store`] on output or storage failures.
#[allow(
    clippy::cast_precision_loss,
    reason = "Artifact counts are far below the f64 integer precision bound."
)]
pub fn generate_rtm<S: ComplianceStore>(
    store: &S,
    project_id: &ProjectId,
    cui: &CuiConfig,
    now: Timestamp,
) -> Result<RtmOutput, RtmError> {
    let project = store.load_project(project_id)?;
    let project_dir = project
        .directory_path
        .as_ref()
        .filter(|path| path.is_dir())
        .ok_or_else(|| {
            RtmError::InvalidTarget(format!(
                "project '{project_id}' has no accessible directory"
            ))
        })?
        .clone();

    let requirements = discover_requirements(&project_dir);
    let design = discover_design(&project_dir);
    let code = discover_code(&project_dir);
    let tests = discover_tests(&project_dir);

    let forward = build_forward(&requirements, &design, &code, &tests);
    let backward = build_backward(&tests, &requirements);

    let traced_count = forward.iter().filter(|trace| !trace.test_files.is_empty()).count() as u64;
    let total_requirements = forward.len() as u64;
    let coverage = if total_requirements == 0 {
        0.0
    } else {
        ((100.0 * traced_count as f64 / total_requirements as f64) * 10.0).round() / 10.0
    };
    let untested: Vec<&ForwardTrace> =
        forward.iter().filter(|trace| trace.test_files.is_empty()).collect();
    let orphans: Vec<&BackwardTrace> =
        backward.iter().filter(|trace| trace.status == "Orphan").collect();
    let gap_count = (untested.len() + orphans.len()) as u64;

    let rtm_dir = project_dir.join("compliance").join("rtm");
    std::fs::create_dir_all(&rtm_dir)
        .map_err(|err| RtmError::Io(format!("{}: {err}", rtm_dir.display())))?;
    let report_file = rtm_dir.join("rtm-report.md");
    let data_file = rtm_dir.join("rtm-data.json");

    let markdown = cui.apply(&render_markdown(
        &project.name,
        project_id,
        &requirements,
        &design,
        &code,
        &tests,
        &forward,
        &backward,
        coverage,
        traced_count,
        now,
    ));
    std::fs::write(&report_file, &markdown)
        .map_err(|err| RtmError::Io(format!("{}: {err}", report_file.display())))?;

    let data = json!({
        "project_id": project_id,
        "generated_at": now.as_rfc3339_seconds(),
        "coverage": coverage,
        "traced_count": traced_count,
        "total_requirements": total_requirements,
        "forward_trace": forward,
        "backward_trace": backward,
        "gaps": {
            "untested_requirements": untested,
            "orphan_tests": orphans,
            "gap_count": gap_count,
        },
    });
    let data_text = serde_json::to_string_pretty(&data)
        .map_err(|err| RtmError::Io(err.to_string()))?;
    std::fs::write(&data_file, data_text)
        .map_err(|err| RtmError::Io(format!("{}: {err}", data_file.display())))?;

    let mut warnings = Vec::new();
    let event = AuditEvent::new(
        project_id.clone(),
        "compliance_check",
        format!(
            "RTM generated: {total_requirements} requirements, {coverage:.1}% coverage, \
             {gap_count} gaps"
        ),
        json!({
            "coverage": coverage,
            "traced_count": traced_count,
            "total_requirements": total_requirements,
            "gap_count": gap_count,
        }),
        now,
    )
    .with_actor("muster-ivv-engine")
    .with_affected_file(report_file.display().to_string());
    if let Err(error) = store.append_audit(&event) {
        warnings.push(format!("audit event not recorded: {error}"));
    }

    Ok(RtmOutput {
        status: "success".to_string(),
        report_file,
        data_file,
        coverage,
        traced_count,
        total_requirements,
        forward,
        backward,
        gap_count,
        warnings,
    })
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the RTM Markdown body (before CUI marking).
#[allow(
    clippy::too_many_arguments,
    reason = "Section rendering consumes every computed artifact once."
)]
fn render_markdown(
    project_name: &str,
    project_id: &ProjectId,
    requirements: &[Artifact],
    design: &[Artifact],
    code: &[Artifact],
    tests: &[Artifact],
    forward: &[ForwardTrace],
    backward: &[BackwardTrace],
    coverage: f64,
    traced_count: u64,
    now: Timestamp,
) -> String {
    let mut lines = vec![
        "# Requirements Traceability Matrix (RTM)".to_string(),
        String::new(),
        format!("**Project:** {project_name}"),
        format!("**Project ID:** {project_id}"),
        format!("**Generated:** {}", now.as_utc_display()),
        String::new(),
        "---".to_string(),
        String::new(),
        "## 1. Artifact Discovery Summary".to_string(),
        String::new(),
        "| Artifact Type | Count |".to_string(),
        "|---------------|------:|".to_string(),
        format!("| Requirements | {} |", requirements.len()),
        format!("| Design Artifacts | {} |", design.len()),
        format!("| Code Modules | {} |", code.len()),
        format!("| Test Files | {} |", tests.len()),
        String::new(),
        "## 2. Coverage Summary".to_string(),
        String::new(),
        format!("**Forward Traceability Coverage:** {coverage:.1}%"),
        format!("**Requirements with Tests:** {traced_count} / {}", forward.len()),
        String::new(),
        "## 3. Forward Traceability (Requirements -> Artifacts)".to_string(),
        String::new(),
        "| Req ID | Title | Design | Code | Tests | Status |".to_string(),
        "|--------|-------|--------|------|-------|--------|".to_string(),
    ];
    for trace in forward {
        let ids = |refs: &[MatchRef]| -> String {
            if refs.is_empty() {
                "--".to_string()
            } else {
                refs.iter().map(|r| r.id.clone()).collect::<Vec<String>>().join(", ")
            }
        };
        let status_mark = match trace.status.as_str() {
            "Traced" => "Traced".to_string(),
            "Partial" => "**Partial**".to_string(),
            _ => "**GAP**".to_string(),
        };
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {status_mark} |",
            trace.requirement_id,
            trace.requirement_title,
            ids(&trace.design_artifacts),
            ids(&trace.code_modules),
            ids(&trace.test_files)
        ));
    }
    lines.extend([
        String::new(),
        "## 4. Backward Traceability (Tests -> Requirements)".to_string(),
        String::new(),
        "| Test ID | Test Name | Type | Matched Requirements | Status |".to_string(),
        "|---------|-----------|------|---------------------|--------|".to_string(),
    ]);
    for trace in backward {
        let matched = if trace.matched_requirements.is_empty() {
            "--".to_string()
        } else {
            trace
                .matched_requirements
                .iter()
                .map(|r| r.id.clone())
                .collect::<Vec<String>>()
                .join(", ")
        };
        let status_mark =
            if trace.status == "Traced" { "Traced".to_string() } else { "**ORPHAN**".to_string() };
        lines.push(format!(
            "| {} | {} | {} | {matched} | {status_mark} |",
            trace.test_id, trace.test_name, trace.test_type
        ));
    }
    lines.extend([String::new(), "## 5. Gap Analysis".to_string(), String::new()]);
    let untested: Vec<&ForwardTrace> =
        forward.iter().filter(|trace| trace.test_files.is_empty()).collect();
    if untested.is_empty() {
        lines.push("*All requirements have at least one matching test.*".to_string());
    } else {
        lines.push(format!(
            "The following {} requirement(s) have no matching test files:",
            untested.len()
        ));
        lines.push(String::new());
        for trace in untested {
            lines.push(format!("- {} {}", trace.requirement_id, trace.requirement_title));
        }
    }
    lines.push(String::new());
    let orphans: Vec<&BackwardTrace> =
        backward.iter().filter(|trace| trace.status == "Orphan").collect();
    if orphans.is_empty() {
        lines.push("*All tests trace to at least one requirement.*".to_string());
    } else {
        lines.push(format!("The following {} test(s) have no matching requirement:", orphans.len()));
        lines.push(String::new());
        for trace in orphans {
            lines.push(format!("- {} {}", trace.test_id, trace.test_name));
        }
    }
    lines.join("\n")
}
