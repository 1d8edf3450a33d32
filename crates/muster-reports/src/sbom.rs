// crates/muster-reports/src/sbom.rs
// ============================================================================
// Module: SBOM Builder
// Description: CycloneDX 1.4 SBOM generation across package ecosystems.
// Purpose: Parse dependency manifests with line-level rules, dedup by purl.
// Dependencies: muster-core, regex, serde, serde_json
// ============================================================================

//! ## Overview
//! The SBOM builder inspects the project root for known dependency files,
//! parses each with regex-level rules (no language runtimes), normalizes
//! versions, and emits a CycloneDX 1.4 JSON document. Components dedup by
//! purl; each `bom-ref` is the 16-hex SHA-256 of `group/name@version`.
//! Document metadata carries the CUI classification properties. Serial
//! numbers derive deterministically from the project, version, and
//! timestamp so identical inputs reproduce identical documents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::ProjectId;
use muster_core::SbomRecord;
use muster_core::StoreError;
use muster_core::Timestamp;
use muster_core::hashing;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// CycloneDX spec version emitted by the builder.
const CYCLONEDX_SPEC_VERSION: &str = "1.4";

/// CycloneDX schema reference.
const CYCLONEDX_SCHEMA: &str = "http://cyclonedx.org/schema/bom-1.4.schema.json";

/// Version placeholder for unpinned dependencies.
const UNSPECIFIED: &str = "unspecified";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// SBOM generation errors.
#[derive(Debug, Error)]
pub enum SbomError {
    /// Project does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage failure.
    #[error("store error: {0}")]
    Store(StoreError),
    /// Output file I/O failure.
    #[error("sbom io error: {0}")]
    Io(String),
}

impl From<StoreError> for SbomError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => Self::NotFound(message),
            other => Self::Store(other),
        }
    }
}

// ============================================================================
// SECTION: Component Model
// ============================================================================

/// One parsed dependency component.
///
/// # Invariants
/// - `purl` uniquely identifies the component within the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Component name (without group).
    pub name: String,
    /// Component version or `unspecified`.
    pub version: String,
    /// Package URL.
    pub purl: String,
    /// CycloneDX scope (`required` or `optional`).
    pub scope: String,
    /// Group or npm scope; empty when none.
    pub group: String,
}

impl Component {
    /// Builds a component with an empty group.
    fn new(name: impl Into<String>, version: impl Into<String>, purl: String, scope: &str) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            purl,
            scope: scope.to_string(),
            group: String::new(),
        }
    }
}

/// Result of one SBOM generation run.
#[derive(Debug, Clone, Serialize)]
pub struct SbomOutput {
    /// Outcome label (`success`).
    pub status: String,
    /// Written SBOM path.
    pub output_file: PathBuf,
    /// SBOM version label (`{n}.0`).
    pub version: String,
    /// Unique component count.
    pub component_count: u64,
    /// Ecosystem labels detected in the project root.
    pub detected: Vec<String>,
    /// Rendered CycloneDX document.
    pub document: Value,
    /// Non-fatal warnings surfaced to the caller's diagnostics stream.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Version Helpers
// ============================================================================

/// Normalizes an npm-style version spec (`^4.17.21` -> `4.17.21`).
fn clean_version_spec(spec: &str) -> String {
    let trimmed = spec.trim_start_matches(['^', '~', '>', '=', '<']).trim();
    if trimmed.is_empty() || trimmed == "*" {
        UNSPECIFIED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds a purl with the version appended only when pinned.
fn purl_with_version(base: String, version: &str) -> String {
    if version == UNSPECIFIED { base } else { format!("{base}@{version}") }
}

/// Splits an npm package name into `(group, name, purl_name)`.
fn split_npm_name(name: &str) -> (String, String, String) {
    let purl_name =
        if name.contains('/') { name.replace('/', "%2F") } else { name.to_string() };
    if let Some(rest) = name.strip_prefix('@')
        && let Some((scope, pkg)) = rest.split_once('/')
    {
        (format!("@{scope}"), pkg.to_string(), purl_name)
    } else {
        (String::new(), name.to_string(), purl_name)
    }
}

// ============================================================================
// SECTION: Python Parsers
// ============================================================================

/// Parses a `requirements.txt` file.
fn parse_requirements_txt(text: &str, components: &mut Vec<Component>) {
    let Ok(line_re) =
        Regex::new(r"^([a-zA-Z0-9._-]+)\s*(?:([<>=!~]+)\s*([a-zA-Z0-9.*_-]+))?")
    else {
        return;
    };
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if line.contains("://") || line.starts_with('.') {
            continue;
        }
        let Some(captures) = line_re.captures(line) else {
            continue;
        };
        let Some(raw_name) = captures.get(1) else {
            continue;
        };
        let name = raw_name.as_str().to_lowercase().replace('_', "-");
        let version = captures
            .get(3)
            .map_or_else(|| UNSPECIFIED.to_string(), |m| m.as_str().to_string());
        let purl = purl_with_version(format!("pkg:pypi/{name}"), &version);
        components.push(Component::new(name, version, purl, "required"));
    }
}

/// Parses the top-level `dependencies = [...]` array of a `pyproject.toml`.
fn parse_pyproject_toml(text: &str, components: &mut Vec<Component>) {
    let Ok(array_re) = Regex::new(r"(?s)dependencies\s*=\s*\[(.*?)\]") else {
        return;
    };
    let Ok(dep_re) =
        Regex::new(r#"^([a-zA-Z0-9._-]+)(?:\[.*?\])?\s*(?:([<>=!~]+)\s*(.+))?$"#)
    else {
        return;
    };
    let Ok(quoted_re) = Regex::new(r#""([^"]+)"|'([^']+)'"#) else {
        return;
    };
    let Some(array) = array_re.captures(text).and_then(|captures| captures.get(1)) else {
        return;
    };
    for quoted in quoted_re.captures_iter(array.as_str()) {
        let Some(spec) = quoted.get(1).or_else(|| quoted.get(2)) else {
            continue;
        };
        let Some(captures) = dep_re.captures(spec.as_str().trim()) else {
            continue;
        };
        let Some(raw_name) = captures.get(1) else {
            continue;
        };
        let name = raw_name.as_str().to_lowercase().replace('_', "-");
        let version = captures.get(3).map_or_else(
            || UNSPECIFIED.to_string(),
            |m| m.as_str().split(',').next().unwrap_or(UNSPECIFIED).trim().to_string(),
        );
        let purl = purl_with_version(format!("pkg:pypi/{name}"), &version);
        components.push(Component::new(name, version, purl, "required"));
    }
}

// ============================================================================
// SECTION: JavaScript Parsers
// ============================================================================

/// Parses `package.json` dependency sections.
fn parse_package_json(text: &str, components: &mut Vec<Component>) {
    let Ok(document) = serde_json::from_str::<Value>(text) else {
        return;
    };
    for (section, scope) in [
        ("dependencies", "required"),
        ("devDependencies", "optional"),
        ("peerDependencies", "optional"),
    ] {
        let Some(deps) = document.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, spec) in deps {
            let version = clean_version_spec(spec.as_str().unwrap_or_default());
            let (group, pkg_name, purl_name) = split_npm_name(name);
            let purl = purl_with_version(format!("pkg:npm/{purl_name}"), &version);
            components.push(Component {
                name: pkg_name,
                version,
                purl,
                scope: scope.to_string(),
                group,
            });
        }
    }
}

/// Parses `package-lock.json`, preferring the v2/v3 `packages` map.
fn parse_package_lock(text: &str, components: &mut Vec<Component>) {
    let Ok(document) = serde_json::from_str::<Value>(text) else {
        return;
    };
    let packages = document.get("packages").and_then(Value::as_object);
    if let Some(packages) = packages
        && !packages.is_empty()
    {
        for (pkg_path, info) in packages {
            if pkg_path.is_empty() {
                continue;
            }
            let name = pkg_path.trim_start_matches("node_modules/");
            if name.len() > 1 && name[1..].contains("node_modules/") {
                continue;
            }
            let version = info
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or(UNSPECIFIED)
                .to_string();
            let scope =
                if info.get("dev").and_then(Value::as_bool).unwrap_or(false) {
                    "optional"
                } else {
                    "required"
                };
            let (group, pkg_name, purl_name) = split_npm_name(name);
            components.push(Component {
                name: pkg_name,
                version: version.clone(),
                purl: format!("pkg:npm/{purl_name}@{version}"),
                scope: scope.to_string(),
                group,
            });
        }
        return;
    }
    // Fallback: v1 `dependencies` map.
    let Some(deps) = document.get("dependencies").and_then(Value::as_object) else {
        return;
    };
    for (name, info) in deps {
        let version =
            info.get("version").and_then(Value::as_str).unwrap_or(UNSPECIFIED).to_string();
        let scope = if info.get("dev").and_then(Value::as_bool).unwrap_or(false) {
            "optional"
        } else {
            "required"
        };
        let (group, pkg_name, purl_name) = split_npm_name(name);
        components.push(Component {
            name: pkg_name,
            version: version.clone(),
            purl: format!("pkg:npm/{purl_name}@{version}"),
            scope: scope.to_string(),
            group,
        });
    }
}

// ============================================================================
// SECTION: Go / Rust Parsers
// ============================================================================

/// Parses `go.mod` require blocks and single-line requires.
fn parse_go_mod(text: &str, components: &mut Vec<Component>) {
    let Ok(block_re) = Regex::new(r"(?s)require\s*\((.*?)\)") else {
        return;
    };
    let Ok(single_re) = Regex::new(r"(?m)^require\s+(\S+)\s+(\S+)") else {
        return;
    };
    let push = |module: &str, version: &str, components: &mut Vec<Component>| {
        let purl = format!("pkg:golang/{module}@{version}");
        components.push(Component::new(module, version, purl, "required"));
    };
    for block in block_re.captures_iter(text) {
        let Some(body) = block.get(1) else {
            continue;
        };
        for line in body.as_str().lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            if let (Some(module), Some(version)) = (parts.next(), parts.next()) {
                push(module, version, components);
            }
        }
    }
    for captures in single_re.captures_iter(text) {
        let (Some(module), Some(version)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        // Skip the opening line of a parenthesized require block.
        if module.as_str() == "(" || version.as_str() == "(" {
            continue;
        }
        let version = version.as_str().split("//").next().unwrap_or("").trim();
        if !version.is_empty() {
            push(module.as_str(), version, components);
        }
    }
}

/// Parses `Cargo.toml` dependency sections line by line.
fn parse_cargo_toml(text: &str, components: &mut Vec<Component>) {
    let Ok(section_re) = Regex::new(r"^\[(.+)\]$") else {
        return;
    };
    let Ok(simple_re) = Regex::new(r#"^([a-zA-Z0-9_-]+)\s*=\s*"([^"]*)""#) else {
        return;
    };
    let Ok(table_re) = Regex::new(r"^([a-zA-Z0-9_-]+)\s*=\s*\{(.*)\}") else {
        return;
    };
    let Ok(version_re) = Regex::new(r#"version\s*=\s*"([^"]*)""#) else {
        return;
    };
    let mut current_section: Option<String> = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(captures) = section_re.captures(line) {
            current_section =
                captures.get(1).map(|section| section.as_str().trim().to_string());
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let scope = match current_section.as_deref() {
            Some("dependencies") => "required",
            Some("dev-dependencies") => "optional",
            _ => continue,
        };
        if let Some(captures) = simple_re.captures(line) {
            let (Some(name), Some(version)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let version =
                if version.as_str().is_empty() { UNSPECIFIED } else { version.as_str() };
            let purl = format!("pkg:cargo/{}@{version}", name.as_str());
            components.push(Component::new(name.as_str(), version, purl, scope));
            continue;
        }
        if let Some(captures) = table_re.captures(line) {
            let (Some(name), Some(inner)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let version = version_re
                .captures(inner.as_str())
                .and_then(|v| v.get(1))
                .map_or(UNSPECIFIED, |v| v.as_str());
            let purl = format!("pkg:cargo/{}@{version}", name.as_str());
            components.push(Component::new(name.as_str(), version, purl, scope));
        }
    }
}

// ============================================================================
// SECTION: JVM Parsers
// ============================================================================

/// Parses `pom.xml` dependency blocks with regex extraction.
fn parse_pom_xml(text: &str, components: &mut Vec<Component>) {
    let Ok(block_re) = Regex::new(r"(?s)<dependency>(.*?)</dependency>") else {
        return;
    };
    let extract = |body: &str, tag: &str| -> Option<String> {
        Regex::new(&format!(r"(?s)<{tag}>\s*(.*?)\s*</{tag}>"))
            .ok()?
            .captures(body)?
            .get(1)
            .map(|m| m.as_str().trim().to_string())
    };
    for block in block_re.captures_iter(text) {
        let Some(body) = block.get(1) else {
            continue;
        };
        let body = body.as_str();
        let (Some(group), Some(artifact)) =
            (extract(body, "groupId"), extract(body, "artifactId"))
        else {
            continue;
        };
        let version = extract(body, "version").unwrap_or_else(|| "managed".to_string());
        let maven_scope = extract(body, "scope").unwrap_or_else(|| "compile".to_string());
        let scope =
            if maven_scope == "test" || maven_scope == "provided" { "optional" } else { "required" };
        components.push(Component {
            name: artifact.clone(),
            version: version.clone(),
            purl: format!("pkg:maven/{group}/{artifact}@{version}"),
            scope: scope.to_string(),
            group,
        });
    }
}

/// Parses Gradle build scripts for quoted `group:artifact:version` deps.
fn parse_build_gradle(text: &str, components: &mut Vec<Component>) {
    let Ok(dep_re) = Regex::new(
        r#"(?m)(implementation|api|compileOnly|runtimeOnly|testImplementation|testCompileOnly|testRuntimeOnly)\s*[('"]([^'"]+)['")]"#,
    ) else {
        return;
    };
    for captures in dep_re.captures_iter(text) {
        let (Some(config), Some(spec)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let parts: Vec<&str> = spec.as_str().split(':').collect();
        if parts.len() < 3 {
            continue;
        }
        let (group, artifact, version) = (parts[0].trim(), parts[1].trim(), parts[2].trim());
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            continue;
        }
        let config = config.as_str();
        let scope = if config.starts_with("test") || config == "compileOnly" {
            "optional"
        } else {
            "required"
        };
        components.push(Component {
            name: artifact.to_string(),
            version: version.to_string(),
            purl: format!("pkg:maven/{group}/{artifact}@{version}"),
            scope: scope.to_string(),
            group: group.to_string(),
        });
    }
}

// ============================================================================
// SECTION: .NET Parsers
// ============================================================================

/// Parses `.csproj` PackageReference elements (attribute-order tolerant).
fn parse_csproj(text: &str, components: &mut Vec<Component>) {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let patterns = [
        (r#"<PackageReference\s+Include="([^"]+)"\s+Version="([^"]+)"\s*/?>"#, false),
        (r#"<PackageReference\s+Version="([^"]+)"\s+Include="([^"]+)"\s*/?>"#, true),
        (
            r#"(?s)<PackageReference\s+Include="([^"]+)"[^/]*?>.*?<Version>([^<]+)</Version>.*?</PackageReference>"#,
            false,
        ),
    ];
    for (pattern, swapped) in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        for captures in re.captures_iter(text) {
            let (Some(first), Some(second)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let (name, version) = if swapped {
                (second.as_str(), first.as_str())
            } else {
                (first.as_str(), second.as_str())
            };
            if !seen.insert(name.to_string()) {
                continue;
            }
            let version = version.trim();
            let purl = format!("pkg:nuget/{name}@{version}");
            components.push(Component::new(name, version, purl, "required"));
        }
    }
}

/// Parses the legacy `packages.config` format.
fn parse_packages_config(text: &str, components: &mut Vec<Component>) {
    let Ok(re) = Regex::new(r#"<package\s+[^>]*id="([^"]+)"[^>]*version="([^"]+)"[^>]*/?>"#)
    else {
        return;
    };
    for captures in re.captures_iter(text) {
        let (Some(name), Some(version)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let purl = format!("pkg:nuget/{}@{}", name.as_str(), version.as_str());
        components.push(Component::new(name.as_str(), version.as_str(), purl, "required"));
    }
}

// ============================================================================
// SECTION: Detection
// ============================================================================

/// One detected ecosystem file with its parser.
type ParserEntry = (&'static str, &'static str, fn(&str, &mut Vec<Component>));

/// Ecosystem detection table: `(label, filename, parser)`.
const PARSERS: [ParserEntry; 9] = [
    ("python-requirements", "requirements.txt", parse_requirements_txt),
    ("python-pyproject", "pyproject.toml", parse_pyproject_toml),
    ("javascript-package", "package.json", parse_package_json),
    ("javascript-package-lock", "package-lock.json", parse_package_lock),
    ("go-mod", "go.mod", parse_go_mod),
    ("rust-cargo", "Cargo.toml", parse_cargo_toml),
    ("java-maven", "pom.xml", parse_pom_xml),
    ("java-gradle", "build.gradle", parse_build_gradle),
    ("csharp-packages", "packages.config", parse_packages_config),
];

/// Parses every detected dependency file under the project root.
fn parse_project(project_dir: &Path, detected: &mut Vec<String>) -> Vec<Component> {
    let mut components = Vec::new();
    for (label, filename, parser) in PARSERS {
        let path = project_dir.join(filename);
        if !path.is_file() {
            continue;
        }
        detected.push(label.to_string());
        if let Ok(text) = std::fs::read_to_string(&path) {
            parser(&text, &mut components);
        }
    }
    // Kotlin-DSL Gradle variant.
    let kts = project_dir.join("build.gradle.kts");
    if kts.is_file() {
        detected.push("java-gradle-kts".to_string());
        if let Ok(text) = std::fs::read_to_string(&kts) {
            parse_build_gradle(&text, &mut components);
        }
    }
    // Any .csproj in the project root.
    if let Ok(entries) = std::fs::read_dir(project_dir) {
        let mut csprojs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().and_then(|ext| ext.to_str()) == Some("csproj")
            })
            .collect();
        csprojs.sort();
        if !csprojs.is_empty() {
            detected.push("csharp-csproj".to_string());
        }
        for path in csprojs {
            if let Ok(text) = std::fs::read_to_string(&path) {
                parse_csproj(&text, &mut components);
            }
        }
    }
    components
}

// ============================================================================
// SECTION: Document Builder
// ============================================================================

/// Deduplicates components by purl, preserving first-seen order.
fn dedup_by_purl(components: Vec<Component>) -> Vec<Component> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    components.into_iter().filter(|component| seen.insert(component.purl.clone())).collect()
}

/// Builds the CycloneDX bom-ref for a component.
fn bom_ref(component: &Component) -> String {
    let key = format!("{}/{}@{}", component.group, component.name, component.version);
    hashing::short_digest(key.as_bytes())
}

/// Derives a deterministic serial number in URN UUID form.
fn serial_number(project_id: &ProjectId, version: &str, now: Timestamp) -> String {
    let digest = hashing::sha256_hex(
        format!("{project_id}:{version}:{}", now.as_unix_millis()).as_bytes(),
    );
    format!(
        "urn:uuid:{}-{}-{}-{}-{}",
        &digest[0..8],
        &digest[8..12],
        &digest[12..16],
        &digest[16..20],
        &digest[20..32]
    )
}

/// Builds the CycloneDX 1.4 document for a component set.
fn build_document(
    project_id: &ProjectId,
    project_name: &str,
    components: &[Component],
    version: &str,
    now: Timestamp,
) -> Value {
    let cdx_components: Vec<Value> = components
        .iter()
        .map(|component| {
            let mut entry = json!({
                "type": "library",
                "bom-ref": bom_ref(component),
                "name": component.name,
                "version": component.version,
                "purl": component.purl,
                "scope": component.scope,
            });
            if !component.group.is_empty()
                && let Some(object) = entry.as_object_mut()
            {
                object.insert("group".to_string(), json!(component.group));
            }
            entry
        })
        .collect();
    json!({
        "$schema": CYCLONEDX_SCHEMA,
        "bomFormat": "CycloneDX",
        "specVersion": CYCLONEDX_SPEC_VERSION,
        "serialNumber": serial_number(project_id, version, now),
        "version": 1,
        "metadata": {
            "timestamp": now.as_rfc3339_seconds(),
            "tools": [{
                "vendor": "Muster",
                "name": "muster-sbom-builder",
                "version": "1.0.0",
            }],
            "component": {
                "type": "application",
                "bom-ref": format!("muster-{project_id}"),
                "name": project_name,
                "version": "0.0.0",
            },
            "properties": [
                {"name": "muster:classification", "value": "CUI // SP-CTI"},
                {"name": "muster:project-id", "value": project_id.as_str()},
                {"name": "muster:cui-category", "value": "CTI"},
                {
                    "name": "muster:distribution",
                    "value": "Distribution D -- Authorized DoD Personnel Only",
                },
            ],
        },
        "components": cdx_components,
    })
}

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// Generates a CycloneDX SBOM for a project and records it.
///
/// # Errors
///
/// Returns [`SbomError::NotFound`] when the project does not exist and
/// [`SbomError::Io`]/[`SbomError::Store`] on output or storage failures.
pub fn generate_sbom<S: ComplianceStore>(
    store: &S,
    project_id: &ProjectId,
    output_path: Option<&Path>,
    fallback_dir: &Path,
    now: Timestamp,
) -> Result<SbomOutput, SbomError> {
    let project = store.load_project(project_id)?;
    let mut warnings = Vec::new();
    let mut detected = Vec::new();

    let components = match project.directory_path.as_ref().filter(|path| path.is_dir()) {
        Some(project_dir) => parse_project(project_dir, &mut detected),
        None => {
            warnings.push(
                "project directory not found; generating empty SBOM with metadata only"
                    .to_string(),
            );
            Vec::new()
        }
    };
    let components = dedup_by_purl(components);
    let component_count = components.len() as u64;

    let prior = store.count_sbom_records(project_id)?;
    let version = format!("{}.0", prior + 1);
    let document = build_document(project_id, &project.name, &components, &version, now);

    let output_file = output_path.map_or_else(
        || {
            let filename = format!("sbom-v{version}.cdx.json");
            project.directory_path.as_ref().map_or_else(
                || fallback_dir.join(project_id.as_str()).join("compliance").join(&filename),
                |dir| dir.join("compliance").join(&filename),
            )
        },
        Path::to_path_buf,
    );
    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| SbomError::Io(format!("{}: {err}", parent.display())))?;
    }
    let text = serde_json::to_string_pretty(&document)
        .map_err(|err| SbomError::Io(err.to_string()))?;
    std::fs::write(&output_file, text)
        .map_err(|err| SbomError::Io(format!("{}: {err}", output_file.display())))?;

    store.record_sbom(&SbomRecord {
        project_id: project_id.clone(),
        version: version.clone(),
        format: "cyclonedx".to_string(),
        file_path: output_file.display().to_string(),
        component_count,
        vulnerability_count: 0,
        created_at: now,
    })?;
    let event = AuditEvent::new(
        project_id.clone(),
        "sbom_generated",
        format!("SBOM v{version} generated with {component_count} components"),
        json!({
            "version": version,
            "format": "cyclonedx",
            "component_count": component_count,
            "output_file": output_file.display().to_string(),
            "detected": detected,
        }),
        now,
    )
    .with_affected_file(output_file.display().to_string());
    if let Err(error) = store.append_audit(&event) {
        warnings.push(format!("audit event not recorded: {error}"));
    }

    Ok(SbomOutput {
        status: "success".to_string(),
        output_file,
        version,
        component_count,
        detected,
        document,
        warnings,
    })
}

#[cfg(test)]
mod tests;
