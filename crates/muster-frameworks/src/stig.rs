// crates/muster-frameworks/src/stig.rs
// ============================================================================
// Module: STIG Checker
// Description: Deterministic web-application STIG checks over a project tree.
// Purpose: Produce findings, per-severity counts, and the CAT1 security gate.
// Dependencies: crate::assessor, crate::scan, muster-core, regex, serde
// ============================================================================

//! ## Overview
//! The STIG checker evaluates the built-in web-application checklist against
//! a project directory. Each rule is a total file-scan: pattern hits that
//! prove a weakness yield `Open`; positive indicators that cannot be proven
//! complete yield `Not_Reviewed` with a manual-review comment (a deliberate
//! conservative default). Findings replace the project's prior set and the
//! run appends one `stig_checked` audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::Finding;
use muster_core::FindingId;
use muster_core::FindingStatus;
use muster_core::GateResult;
use muster_core::ProjectId;
use muster_core::StigSeverity;
use muster_core::Timestamp;
use muster_core::gates;
use regex::Regex;
use regex::RegexBuilder;
use serde::Serialize;
use serde_json::json;

use crate::assessor::AssessError;
use crate::scan::files_with_extensions;
use crate::scan::read_text;

// ============================================================================
// SECTION: Template
// ============================================================================

/// One checklist entry in the built-in web-application STIG template.
#[derive(Debug, Clone, Copy)]
struct TemplateFinding {
    /// Vulnerability identifier.
    finding_id: &'static str,
    /// Rule identifier.
    rule_id: &'static str,
    /// Severity category.
    severity: StigSeverity,
    /// Finding title.
    title: &'static str,
    /// Remediation fix text.
    fix_text: &'static str,
}

/// Built-in web-application STIG checklist.
const WEBAPP_TEMPLATE: [TemplateFinding; 9] = [
    TemplateFinding {
        finding_id: "V-222602",
        rule_id: "SV-222602r879511",
        severity: StigSeverity::Cat2,
        title: "Sensitive information must not be passed in URL parameters",
        fix_text: "Move session identifiers, tokens, and credentials out of query strings \
                   into headers or request bodies.",
    },
    TemplateFinding {
        finding_id: "V-222604",
        rule_id: "SV-222604r879519",
        severity: StigSeverity::Cat2,
        title: "The application must validate all input",
        fix_text: "Apply parameterized queries and a validation framework to every \
                   externally supplied value.",
    },
    TemplateFinding {
        finding_id: "V-222607",
        rule_id: "SV-222607r879530",
        severity: StigSeverity::Cat1,
        title: "The application must enforce access control on every request",
        fix_text: "Guard every route with authentication and authorization middleware.",
    },
    TemplateFinding {
        finding_id: "V-222609",
        rule_id: "SV-222609r879538",
        severity: StigSeverity::Cat1,
        title: "The application must use FIPS-validated cryptography",
        fix_text: "Replace deprecated algorithms (MD5, SHA-1, DES, RC4) with \
                   FIPS 140-validated modules.",
    },
    TemplateFinding {
        finding_id: "V-222612",
        rule_id: "SV-222612r879549",
        severity: StigSeverity::Cat2,
        title: "Session cookies must set the Secure and HttpOnly flags",
        fix_text: "Enable Secure, HttpOnly, and a SameSite policy on every cookie.",
    },
    TemplateFinding {
        finding_id: "V-222614",
        rule_id: "SV-222614r879556",
        severity: StigSeverity::Cat2,
        title: "The application must emit required security headers",
        fix_text: "Configure Content-Security-Policy, HSTS, X-Content-Type-Options, and \
                   X-Frame-Options on every response.",
    },
    TemplateFinding {
        finding_id: "V-222617",
        rule_id: "SV-222617r879566",
        severity: StigSeverity::Cat2,
        title: "State-changing requests must carry CSRF protection",
        fix_text: "Enable CSRF middleware and token validation for every mutating endpoint.",
    },
    TemplateFinding {
        finding_id: "V-222620",
        rule_id: "SV-222620r879576",
        severity: StigSeverity::Cat2,
        title: "Security-relevant events must be logged",
        fix_text: "Route authentication, authorization, and data-access events through the \
                   audit log per AU-2.",
    },
    TemplateFinding {
        finding_id: "V-222635",
        rule_id: "SV-222635r879887",
        severity: StigSeverity::Cat1,
        title: "Detailed error messages must not be exposed to users",
        fix_text: "Disable debug mode in production and install a generic error handler.",
    },
];

// ============================================================================
// SECTION: Check Helpers
// ============================================================================

/// Compiles case-insensitive patterns, dropping any that fail to parse.
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| RegexBuilder::new(pattern).case_insensitive(true).build().ok())
        .collect()
}

/// Collects project files with the given extensions and their contents.
fn contents(project_dir: &Path, extensions: &[&str]) -> Vec<(String, String)> {
    files_with_extensions(project_dir, extensions)
        .into_iter()
        .filter_map(|path| {
            let text = read_text(&path)?;
            Some((path.display().to_string(), text))
        })
        .collect()
}

/// Returns the files matching any of the patterns.
fn files_matching(files: &[(String, String)], patterns: &[Regex]) -> Vec<String> {
    files
        .iter()
        .filter(|(_, text)| patterns.iter().any(|pattern| pattern.is_match(text)))
        .map(|(path, _)| path.clone())
        .collect()
}

/// Returns true when any file matches any of the patterns.
fn any_match(files: &[(String, String)], patterns: &[Regex]) -> bool {
    !files_matching(files, patterns).is_empty()
}

/// Counts pattern hits across all files.
fn count_matches(files: &[(String, String)], patterns: &[Regex]) -> usize {
    files
        .iter()
        .map(|(_, text)| patterns.iter().filter(|pattern| pattern.is_match(text)).count())
        .sum()
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// V-222602: sensitive information in URL parameters.
fn check_url_parameters(project_dir: &Path) -> (FindingStatus, String) {
    let patterns = compile(&[
        r"[?&](session_id|token|password|secret|api_key)=",
        r"GET.*[?&](auth|credential|ssn)=",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "html"]);
    let issues = files_matching(&files, &patterns);
    if issues.is_empty() {
        (
            FindingStatus::NotReviewed,
            "Automated scan found no obvious issues; manual review needed.".to_string(),
        )
    } else {
        let shown: Vec<&str> = issues.iter().take(5).map(String::as_str).collect();
        (
            FindingStatus::Open,
            format!("Potential sensitive URL params in: {}", shown.join(", ")),
        )
    }
}

/// V-222604: input validation patterns.
fn check_input_validation(project_dir: &Path) -> (FindingStatus, String) {
    let patterns = compile(&[
        r"parameterized|prepared_statement|bindparam",
        r"@validates|@validator|ValidationError|validate_input|sanitize",
        r"escape_html|bleach\.clean|markupsafe\.escape|xss_clean",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "rs"]);
    if any_match(&files, &patterns) {
        (
            FindingStatus::NotReviewed,
            "Validation patterns detected; manual verification of completeness needed."
                .to_string(),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "No validation patterns detected; manual review required.".to_string(),
        )
    }
}

/// V-222607: access control enforcement.
fn check_access_enforcement(project_dir: &Path) -> (FindingStatus, String) {
    let patterns = compile(&[
        r"@login_required|@permission_required|@requires_auth",
        r"requireAuth|isAuthenticated|authorize|checkPermission",
        r"@Secured|@PreAuthorize|@RolesAllowed",
        r"middleware.*auth|authMiddleware|guardRoute",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "rs"]);
    if any_match(&files, &patterns) {
        (
            FindingStatus::NotReviewed,
            "Authorization patterns detected; verify enforcement completeness manually."
                .to_string(),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "No authorization patterns found; manual review required.".to_string(),
        )
    }
}

/// V-222609: FIPS-validated cryptography.
fn check_fips_crypto(project_dir: &Path) -> (FindingStatus, String) {
    let bad = compile(&[r"md5|sha1[^0-9]|DES\b|RC4|arcfour|3DES"]);
    let good = compile(&[r"sha256|sha384|sha512|aes|AES_256|FIPS|fips_mode"]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "rs", "yaml", "yml", "tf"]);
    let found_bad = files_matching(&files, &bad);
    if !found_bad.is_empty() {
        let shown: Vec<&str> = found_bad.iter().take(5).map(String::as_str).collect();
        return (
            FindingStatus::Open,
            format!("Deprecated crypto found in: {}", shown.join(", ")),
        );
    }
    if any_match(&files, &good) {
        (
            FindingStatus::NotReviewed,
            "FIPS-compatible crypto patterns detected; verify FIPS validation status."
                .to_string(),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "No cryptographic usage detected; manual review needed.".to_string(),
        )
    }
}

/// V-222612: Secure and HttpOnly cookie flags.
fn check_cookie_flags(project_dir: &Path) -> (FindingStatus, String) {
    let patterns = compile(&[
        r"SESSION_COOKIE_SECURE\s*=\s*True",
        r"SESSION_COOKIE_HTTPONLY\s*=\s*True",
        r"secure:\s*true.*httpOnly:\s*true|httpOnly:\s*true.*secure:\s*true",
        r"cookie\.setSecure\(true\)|cookie\.setHttpOnly\(true\)",
        r"SameSite.*Strict|SameSite.*Lax",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "yaml", "yml"]);
    if count_matches(&files, &patterns) >= 2 {
        (
            FindingStatus::NotReviewed,
            "Cookie security patterns detected; verify all cookies are covered.".to_string(),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "Cookie security configuration not confirmed; manual review needed.".to_string(),
        )
    }
}

/// V-222614: security headers.
fn check_security_headers(project_dir: &Path) -> (FindingStatus, String) {
    let patterns = compile(&[
        r"Content-Security-Policy|CSP_DEFAULT_SRC|contentSecurityPolicy",
        r"X-Content-Type-Options.*nosniff",
        r"X-Frame-Options.*(DENY|SAMEORIGIN)",
        r"Strict-Transport-Security|HSTS|hsts",
        r"Referrer-Policy",
        r"helmet\(\)|securityHeaders|SecurityMiddleware",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "yaml", "yml", "conf"]);
    let found = count_matches(&files, &patterns);
    if found >= 3 {
        (
            FindingStatus::NotReviewed,
            format!("Security header patterns found ({found} matches); verify all required headers."),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "Security headers not confirmed; manual review needed.".to_string(),
        )
    }
}

/// V-222617: CSRF protection.
fn check_csrf_protection(project_dir: &Path) -> (FindingStatus, String) {
    let patterns = compile(&[
        r"csrf_token|csrfmiddleware|CsrfViewMiddleware",
        r"csurf|csrf\(\)|csrfProtection",
        r"@csrf_protect|csrf_exempt",
        r"CsrfFilter|_csrf|csrfToken",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "html"]);
    if any_match(&files, &patterns) {
        (
            FindingStatus::NotReviewed,
            "CSRF protection patterns detected; verify coverage of all state-changing \
             endpoints."
                .to_string(),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "No CSRF protection patterns found; manual review required.".to_string(),
        )
    }
}

/// V-222620: audit and security logging.
fn check_audit_logging(project_dir: &Path) -> (FindingStatus, String) {
    let patterns = compile(&[
        r"audit_log|audit_trail|security_log",
        r"logging\.getLogger|logger\.\w+|log\.\w+\(",
        r"AuditEvent|SecurityEvent|audit_entry",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "rs"]);
    if any_match(&files, &patterns) {
        (
            FindingStatus::NotReviewed,
            "Logging patterns detected; verify all security events are captured per AU-2."
                .to_string(),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "No structured logging detected; manual review needed.".to_string(),
        )
    }
}

/// V-222635: detailed error exposure.
fn check_error_handling(project_dir: &Path) -> (FindingStatus, String) {
    let bad = compile(&[
        r"DEBUG\s*=\s*True",
        r"NODE_ENV.*development",
        r"traceback\.print_exc|print_stack",
        r"stack_trace.*response|response.*stack_trace",
    ]);
    let good = compile(&[
        r"DEBUG\s*=\s*False",
        r"NODE_ENV.*production",
        r"custom_error_handler|errorHandler|exception_handler",
    ]);
    let files = contents(project_dir, &["py", "js", "ts", "java", "yaml", "yml", "env"]);
    if any_match(&files, &bad) {
        return (
            FindingStatus::Open,
            "Debug mode or detailed error exposure detected.".to_string(),
        );
    }
    if any_match(&files, &good) {
        (
            FindingStatus::NotReviewed,
            "Production error handling detected; verify no leakage of sensitive details."
                .to_string(),
        )
    } else {
        (
            FindingStatus::NotReviewed,
            "Error handling configuration not confirmed; manual review needed.".to_string(),
        )
    }
}

/// Runs the automated check bound to a finding id, when one exists.
fn auto_check(finding_id: &str, project_dir: &Path) -> Option<(FindingStatus, String)> {
    match finding_id {
        "V-222602" => Some(check_url_parameters(project_dir)),
        "V-222604" => Some(check_input_validation(project_dir)),
        "V-222607" => Some(check_access_enforcement(project_dir)),
        "V-222609" => Some(check_fips_crypto(project_dir)),
        "V-222612" => Some(check_cookie_flags(project_dir)),
        "V-222614" => Some(check_security_headers(project_dir)),
        "V-222617" => Some(check_csrf_protection(project_dir)),
        "V-222620" => Some(check_audit_logging(project_dir)),
        "V-222635" => Some(check_error_handling(project_dir)),
        _ => None,
    }
}

// ============================================================================
// SECTION: Run Summary
// ============================================================================

/// Per-status counts for one severity category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// Findings in `Open`.
    pub open: u64,
    /// Findings in `NotAFinding`.
    pub not_a_finding: u64,
    /// Findings in `Not_Applicable`.
    pub not_applicable: u64,
    /// Findings in `Not_Reviewed`.
    pub not_reviewed: u64,
}

/// Result of one STIG checker run.
///
/// # Invariants
/// - `gate_result` is derived solely from `cat1_open`.
#[derive(Debug, Clone, Serialize)]
pub struct StigRunSummary {
    /// Assessed project.
    pub project_id: ProjectId,
    /// STIG template identifier.
    pub stig_id: String,
    /// Per-severity status counts keyed by `CAT1`/`CAT2`/`CAT3`.
    pub severity_counts: BTreeMap<String, SeverityCounts>,
    /// Count of CAT1 findings in `Open`.
    pub cat1_open: u64,
    /// Security gate result.
    pub gate_result: GateResult,
    /// Findings produced by the run.
    pub findings: Vec<Finding>,
    /// Non-fatal warnings surfaced to the caller's diagnostics stream.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// Runs the built-in web-application STIG checklist for a project.
///
/// # Errors
///
/// Returns [`AssessError::NotFound`] when the project does not exist and
/// [`AssessError::Store`] when persistence fails.
pub fn run_stig_check<S: ComplianceStore>(
    store: &S,
    project_id: &ProjectId,
    now: Timestamp,
) -> Result<StigRunSummary, AssessError> {
    let project = store.load_project(project_id)?;
    let mut warnings = Vec::new();
    let project_dir = match &project.directory_path {
        Some(path) if path.is_dir() => Some(path.clone()),
        Some(path) => {
            warnings.push(format!(
                "project directory not found: {}; all checks recorded Not_Reviewed",
                path.display()
            ));
            None
        }
        None => None,
    };

    let mut findings = Vec::with_capacity(WEBAPP_TEMPLATE.len());
    for template in WEBAPP_TEMPLATE {
        let (status, comments) = project_dir
            .as_deref()
            .and_then(|dir| auto_check(template.finding_id, dir))
            .unwrap_or((FindingStatus::NotReviewed, "Requires manual assessment.".to_string()));
        findings.push(Finding {
            project_id: project_id.clone(),
            finding_id: FindingId::new(template.finding_id),
            rule_id: template.rule_id.to_string(),
            severity: template.severity,
            title: template.title.to_string(),
            status,
            evidence: comments,
            fix_text: template.fix_text.to_string(),
            updated_at: now,
        });
    }

    let mut severity_counts: BTreeMap<String, SeverityCounts> = BTreeMap::new();
    for severity in StigSeverity::ALL {
        severity_counts.insert(severity.as_str().to_string(), SeverityCounts::default());
    }
    for finding in &findings {
        if let Some(counts) = severity_counts.get_mut(finding.severity.as_str()) {
            match finding.status {
                FindingStatus::Open => counts.open += 1,
                FindingStatus::NotAFinding => counts.not_a_finding += 1,
                FindingStatus::NotApplicable => counts.not_applicable += 1,
                _ => counts.not_reviewed += 1,
            }
        }
    }
    let cat1_open = severity_counts
        .get(StigSeverity::Cat1.as_str())
        .map_or(0, |counts| counts.open);
    let gate_result = gates::stig_gate(cat1_open);

    let event = AuditEvent::new(
        project_id.clone(),
        "stig_checked",
        format!(
            "STIG webapp checklist: {} findings, gate {}",
            findings.len(),
            gate_result.result_label()
        ),
        json!({
            "stig_id": "webapp",
            "finding_count": findings.len(),
            "cat1_open": cat1_open,
            "gate_result": gate_result.result_label(),
        }),
        now,
    );
    store.replace_findings(project_id, &findings, &event)?;

    Ok(StigRunSummary {
        project_id: project_id.clone(),
        stig_id: "webapp".to_string(),
        severity_counts,
        cat1_open,
        gate_result,
        findings,
        warnings,
    })
}

#[cfg(test)]
mod tests;
