// crates/muster-core/src/clarify/mod.rs
// ============================================================================
// Module: Clarification Engine
// Description: Impact x Uncertainty prioritized clarification questions.
// Purpose: Score spec text and intake rows, emit a bounded question list.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The clarification engine classifies requirement text on two ordinal
//! dimensions — impact and uncertainty — and uses a fixed 3x3 priority
//! matrix (1 = highest) to select which unclear requirements to clarify
//! first. Classification and selection are fully deterministic: keyword sets
//! are fixed arrays scanned in declared order, and ties break by impact rank
//! and then section name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::interfaces::IntakeRequirement;

// ============================================================================
// SECTION: Keyword Sets
// ============================================================================

/// Keywords that mark a requirement as mission critical.
const MISSION_CRITICAL_KEYWORDS: [&str; 14] = [
    "mission",
    "operational",
    "safety",
    "availability",
    "core capability",
    "primary function",
    "critical",
    "life-threatening",
    "warfighter",
    "combat",
    "command and control",
    "c2",
    "real-time",
    "failover",
];

/// Keywords that mark a requirement as compliance driven.
const COMPLIANCE_KEYWORDS: [&str; 20] = [
    "nist",
    "stig",
    "fedramp",
    "cmmc",
    "audit",
    "encryption",
    "authentication",
    "ato",
    "fips",
    "cui",
    "authorization",
    "compliance",
    "accreditation",
    "rmf",
    "poam",
    "ssp",
    "hipaa",
    "pci",
    "iso 27001",
    "soc 2",
];

/// Hedging words that signal an unconfirmed assumption.
const HEDGING_WORDS: [&str; 15] = [
    "should",
    "probably",
    "likely",
    "typically",
    "usually",
    "might",
    "perhaps",
    "may",
    "could",
    "assume",
    "assumed",
    "expected",
    "ideally",
    "generally",
    "presumably",
];

/// Sections every spec is expected to carry.
const REQUIRED_SECTIONS: [&str; 7] = [
    "Feature Description",
    "User Story",
    "Solution Statement",
    "ATO Impact Assessment",
    "Acceptance Criteria",
    "Implementation Plan",
    "Testing Strategy",
];

/// Default maximum number of questions returned.
pub const DEFAULT_MAX_QUESTIONS: usize = 5;

/// Word-count threshold below which text is classified `unknown`.
const UNKNOWN_WORD_THRESHOLD: usize = 10;

/// Heading key under which pre-heading text is stored.
const PREAMBLE_KEY: &str = "_preamble";

// ============================================================================
// SECTION: Classification Dimensions
// ============================================================================

/// Impact classification of a requirement fragment.
///
/// # Invariants
/// - `rank` orders mission critical before compliance before enhancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    /// Mission-critical capability.
    MissionCritical,
    /// Compliance-mandated behavior.
    ComplianceRequired,
    /// Enhancement or convenience behavior.
    Enhancement,
}

impl Impact {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissionCritical => "mission_critical",
            Self::ComplianceRequired => "compliance_required",
            Self::Enhancement => "enhancement",
        }
    }

    /// Returns the tie-break rank (lower is more severe).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::MissionCritical => 0,
            Self::ComplianceRequired => 1,
            Self::Enhancement => 2,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uncertainty classification of a requirement fragment.
///
/// # Invariants
/// - `clarity_value` maps unknown to 0.0, ambiguous to 0.5, assumed to 0.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Uncertainty {
    /// Text is empty, very short, or missing entirely.
    Unknown,
    /// Text contains a known ambiguity pattern phrase.
    Ambiguous,
    /// Text hedges with assumption language.
    Assumed,
}

impl Uncertainty {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Ambiguous => "ambiguous",
            Self::Assumed => "assumed",
        }
    }

    /// Returns the per-section clarity contribution.
    #[must_use]
    pub const fn clarity_value(self) -> f64 {
        match self {
            Self::Unknown => 0.0,
            Self::Ambiguous => 0.5,
            Self::Assumed => 0.8,
        }
    }
}

impl fmt::Display for Uncertainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Priority Matrix
// ============================================================================

/// Returns the matrix priority for an impact/uncertainty pair (1 = highest).
#[must_use]
pub const fn matrix_priority(impact: Impact, uncertainty: Uncertainty) -> u8 {
    match (impact, uncertainty) {
        (Impact::MissionCritical, Uncertainty::Unknown) => 1,
        (Impact::MissionCritical, Uncertainty::Ambiguous)
        | (Impact::ComplianceRequired, Uncertainty::Unknown) => 2,
        (Impact::MissionCritical, Uncertainty::Assumed)
        | (Impact::ComplianceRequired, Uncertainty::Ambiguous)
        | (Impact::Enhancement, Uncertainty::Unknown) => 3,
        (Impact::ComplianceRequired, Uncertainty::Assumed)
        | (Impact::Enhancement, Uncertainty::Ambiguous) => 4,
        (Impact::Enhancement, Uncertainty::Assumed) => 5,
    }
}

/// Enumerates every matrix cell with its priority.
#[must_use]
pub fn matrix_entries() -> Vec<(Impact, Uncertainty, u8)> {
    let impacts = [Impact::MissionCritical, Impact::ComplianceRequired, Impact::Enhancement];
    let uncertainties = [Uncertainty::Unknown, Uncertainty::Ambiguous, Uncertainty::Assumed];
    let mut entries = Vec::with_capacity(impacts.len() * uncertainties.len());
    for impact in impacts {
        for uncertainty in uncertainties {
            entries.push((impact, uncertainty, matrix_priority(impact, uncertainty)));
        }
    }
    entries
}

// ============================================================================
// SECTION: Ambiguity Patterns
// ============================================================================

/// One known ambiguity pattern with its clarification prompt.
///
/// # Invariants
/// - `phrase` is matched as a case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityPattern {
    /// Vague phrase to detect.
    pub phrase: String,
    /// Clarification text quoted into the generated question.
    pub clarification: String,
}

/// Loads ambiguity patterns from a JSON document.
///
/// The document carries a top-level `ambiguity_patterns` array; missing or
/// malformed entries are dropped (graceful fallback to an empty list).
#[must_use]
pub fn load_ambiguity_patterns(document: &Value) -> Vec<AmbiguityPattern> {
    document
        .get("ambiguity_patterns")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let phrase = entry.get("phrase")?.as_str()?.to_string();
                    if phrase.is_empty() {
                        return None;
                    }
                    let clarification = entry
                        .get("clarification")
                        .and_then(Value::as_str)
                        .unwrap_or("provide a measurable definition")
                        .to_string();
                    Some(AmbiguityPattern {
                        phrase,
                        clarification,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Classifiers
// ============================================================================

/// Optional classification context carried from stored requirement rows.
///
/// # Invariants
/// - `requirement_type` uses the intake vocabulary (`security`, `performance`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClarifyContext {
    /// Declared requirement type from intake.
    pub requirement_type: Option<String>,
}

/// Classifies text by impact level.
///
/// Mission-critical keywords win over compliance keywords; the context
/// requirement type is consulted only when no keyword matches.
#[must_use]
pub fn score_impact(text: &str, context: Option<&ClarifyContext>) -> Impact {
    let lower = text.to_lowercase();
    if MISSION_CRITICAL_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return Impact::MissionCritical;
    }
    if COMPLIANCE_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return Impact::ComplianceRequired;
    }
    if let Some(context) = context
        && let Some(requirement_type) = context.requirement_type.as_deref()
    {
        match requirement_type.to_lowercase().as_str() {
            "security" | "compliance" => return Impact::ComplianceRequired,
            "performance" | "infrastructure" => return Impact::MissionCritical,
            _ => {}
        }
    }
    Impact::Enhancement
}

/// Classifies text by uncertainty level.
///
/// Rules, in order: fewer than ten words is `unknown`; a matched ambiguity
/// phrase is `ambiguous`; hedging words (and everything else) are `assumed`.
#[must_use]
pub fn score_uncertainty(text: &str, patterns: &[AmbiguityPattern]) -> Uncertainty {
    let stripped = text.trim();
    if stripped.split_whitespace().count() < UNKNOWN_WORD_THRESHOLD {
        return Uncertainty::Unknown;
    }
    let lower = stripped.to_lowercase();
    if patterns.iter().any(|pattern| lower.contains(&pattern.phrase.to_lowercase())) {
        return Uncertainty::Ambiguous;
    }
    Uncertainty::Assumed
}

/// Returns the first ambiguity pattern whose phrase appears in the text.
#[must_use]
pub fn find_ambiguous_phrase<'a>(
    text: &str,
    patterns: &'a [AmbiguityPattern],
) -> Option<&'a AmbiguityPattern> {
    let lower = text.to_lowercase();
    patterns.iter().find(|pattern| lower.contains(&pattern.phrase.to_lowercase()))
}

/// Returns the first hedging word appearing in the text, scanned in the
/// declared keyword order for determinism.
#[must_use]
pub fn find_hedging_word(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let words: Vec<&str> =
        lower.split(|c: char| !c.is_ascii_alphabetic()).filter(|w| !w.is_empty()).collect();
    HEDGING_WORDS.iter().copied().find(|hedge| words.contains(hedge))
}

// ============================================================================
// SECTION: Items and Question Generation
// ============================================================================

/// One prioritized clarification item.
///
/// # Invariants
/// - `priority` equals `matrix_priority(impact, uncertainty)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarifyItem {
    /// Section or requirement label the item refers to.
    pub section: String,
    /// Impact classification.
    pub impact: Impact,
    /// Uncertainty classification.
    pub uncertainty: Uncertainty,
    /// Matrix priority (1 = highest).
    pub priority: u8,
    /// Generated clarification question.
    pub question: String,
    /// Source text excerpt for reviewer context.
    pub context: String,
    /// Intake requirement id when the item came from a session row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<String>,
}

/// Generates the clarification question for an item.
///
/// Unknown items get a broad open question; ambiguous items quote the vague
/// phrase and its clarification; assumed items quote the hedge word and ask
/// MUST vs SHOULD.
#[must_use]
pub fn generate_question(
    section: &str,
    uncertainty: Uncertainty,
    snippet: &str,
    pattern: Option<&AmbiguityPattern>,
) -> String {
    match uncertainty {
        Uncertainty::Unknown => format!(
            "The section '{section}' appears incomplete or empty. What are the specific \
             requirements for {}?",
            section.to_lowercase()
        ),
        Uncertainty::Ambiguous => pattern.map_or_else(
            || {
                format!(
                    "The section '{section}' contains ambiguous language. Can you provide a \
                     measurable definition?"
                )
            },
            |pattern| {
                format!("In '{section}', you mentioned '{}'. {}", pattern.phrase, pattern.clarification)
            },
        ),
        Uncertainty::Assumed => find_hedging_word(snippet).map_or_else(
            || {
                format!(
                    "The section '{section}' contains assumptions that need confirmation. Can \
                     you clarify the exact requirements?"
                )
            },
            |hedge| {
                format!(
                    "In '{section}', the text uses '{hedge}', which implies an assumption. Is \
                     this a firm requirement (MUST), or a recommendation (SHOULD)? Please \
                     clarify the exact expectation."
                )
            },
        ),
    }
}

/// Sorts items by `(priority, impact rank, section)` and keeps the first N.
#[must_use]
pub fn prioritize(mut items: Vec<ClarifyItem>, max_questions: usize) -> Vec<ClarifyItem> {
    items.sort_by(|a, b| {
        (a.priority, a.impact.rank(), a.section.as_str()).cmp(&(
            b.priority,
            b.impact.rank(),
            b.section.as_str(),
        ))
    });
    items.truncate(max_questions);
    items
}

// ============================================================================
// SECTION: Spec-file Analysis
// ============================================================================

/// Result of one clarity analysis run.
///
/// # Invariants
/// - `questions` is sorted by the documented key and bounded by the caller's
///   maximum.
/// - `clarity_score` is in `[0, 1]`, rounded to four decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarityAnalysis {
    /// Analysis status (`ok`).
    pub status: String,
    /// Number of sections or requirement rows analyzed.
    pub total_items_analyzed: usize,
    /// Number of issues found before truncation.
    pub total_issues_found: usize,
    /// Prioritized clarification questions.
    pub questions: Vec<ClarifyItem>,
    /// Mean clarity score across analyzed items.
    pub clarity_score: f64,
}

/// Splits Markdown into `(heading, body)` pairs on `## ` headings.
///
/// Text before the first heading lands under the `_preamble` key.
#[must_use]
pub fn parse_spec_sections(content: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current_heading = PREAMBLE_KEY.to_string();
    let mut current_lines: Vec<&str> = Vec::new();
    for line in content.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            sections.push((current_heading, current_lines.join("\n").trim().to_string()));
            current_heading = heading.trim().to_string();
            current_lines = Vec::new();
        } else {
            current_lines.push(line);
        }
    }
    sections.push((current_heading, current_lines.join("\n").trim().to_string()));
    sections
}

/// Analyzes spec Markdown for clarity and emits prioritized questions.
///
/// Sections with unknown or ambiguous bodies become candidate items, missing
/// required sections are injected as unknown items, and the clarity score is
/// the mean of the per-section clarity values.
#[must_use]
pub fn analyze_spec_text(
    content: &str,
    patterns: &[AmbiguityPattern],
    max_questions: usize,
) -> ClarityAnalysis {
    let sections = parse_spec_sections(content);
    let mut items = Vec::new();
    let mut section_scores = Vec::new();
    let mut analyzed = 0usize;

    for (heading, body) in &sections {
        if heading == PREAMBLE_KEY {
            continue;
        }
        analyzed += 1;
        let impact = score_impact(body, None);
        let uncertainty = score_uncertainty(body, patterns);
        section_scores.push(uncertainty.clarity_value());
        if matches!(uncertainty, Uncertainty::Unknown | Uncertainty::Ambiguous) {
            let pattern = find_ambiguous_phrase(body, patterns);
            items.push(ClarifyItem {
                section: heading.clone(),
                impact,
                uncertainty,
                priority: matrix_priority(impact, uncertainty),
                question: generate_question(heading, uncertainty, body, pattern),
                context: truncate_chars(body, 300),
                requirement_id: None,
            });
        }
    }

    let present: Vec<String> = sections
        .iter()
        .filter(|(heading, _)| heading != PREAMBLE_KEY)
        .map(|(heading, _)| heading.to_lowercase())
        .collect();
    for expected in REQUIRED_SECTIONS {
        if present.iter().any(|heading| heading == &expected.to_lowercase()) {
            continue;
        }
        let impact = score_impact(expected, None);
        items.push(ClarifyItem {
            section: expected.to_string(),
            impact,
            uncertainty: Uncertainty::Unknown,
            priority: matrix_priority(impact, Uncertainty::Unknown),
            question: format!(
                "The required section '{expected}' is missing from the spec. What are the \
                 requirements for {}?",
                expected.to_lowercase()
            ),
            context: "Section not found in specification.".to_string(),
            requirement_id: None,
        });
        section_scores.push(0.0);
    }

    let total_issues_found = items.len();
    let questions = prioritize(items, max_questions);
    ClarityAnalysis {
        status: "ok".to_string(),
        total_items_analyzed: analyzed,
        total_issues_found,
        questions,
        clarity_score: round4(mean(&section_scores)),
    }
}

// ============================================================================
// SECTION: Session Analysis
// ============================================================================

/// Analyzes stored intake requirement rows for clarity.
///
/// Each row's `requirement_type` is used as classification context. Rows
/// whose stored clarity score is lower than the derived one keep the stored
/// value, and assumed rows with completeness below 0.5 become candidates
/// even when hedge detection missed them.
#[must_use]
pub fn analyze_requirement_rows(
    rows: &[IntakeRequirement],
    patterns: &[AmbiguityPattern],
    max_questions: usize,
) -> ClarityAnalysis {
    let mut items = Vec::new();
    let mut clarity_values = Vec::new();

    for row in rows {
        let context = ClarifyContext {
            requirement_type: Some(row.requirement_type.clone()),
        };
        let impact = score_impact(&row.raw_text, Some(&context));
        let uncertainty = score_uncertainty(&row.raw_text, patterns);
        let mut clarity_value = uncertainty.clarity_value();
        if let Some(stored) = row.clarity_score {
            clarity_value = clarity_value.min(stored);
        }
        clarity_values.push(clarity_value);

        let section = format!("Requirement {} ({})", row.id, row.requirement_type);
        match uncertainty {
            Uncertainty::Unknown | Uncertainty::Ambiguous => {
                let pattern = find_ambiguous_phrase(&row.raw_text, patterns);
                items.push(ClarifyItem {
                    section: section.clone(),
                    impact,
                    uncertainty,
                    priority: matrix_priority(impact, uncertainty),
                    question: generate_question(&section, uncertainty, &row.raw_text, pattern),
                    context: truncate_chars(&row.raw_text, 300),
                    requirement_id: Some(row.id.clone()),
                });
            }
            Uncertainty::Assumed => {
                let low_completeness =
                    row.completeness_score.is_some_and(|score| score < 0.5);
                let low_clarity = row.clarity_score.is_some_and(|score| score < 0.5);
                if low_completeness || low_clarity {
                    items.push(ClarifyItem {
                        section: section.clone(),
                        impact,
                        uncertainty: Uncertainty::Assumed,
                        priority: matrix_priority(impact, Uncertainty::Assumed),
                        question: generate_question(
                            &section,
                            Uncertainty::Assumed,
                            &row.raw_text,
                            None,
                        ),
                        context: truncate_chars(&row.raw_text, 300),
                        requirement_id: Some(row.id.clone()),
                    });
                }
            }
        }
    }

    let total_issues_found = items.len();
    let questions = prioritize(items, max_questions);
    ClarityAnalysis {
        status: "ok".to_string(),
        total_items_analyzed: rows.len(),
        total_issues_found,
        questions,
        clarity_score: round4(mean(&clarity_values)),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Truncates a string to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Mean of a slice; zero when empty.
#[allow(
    clippy::cast_precision_loss,
    reason = "Section counts are far below the f64 integer precision bound."
)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / (values.len() as f64)
}

/// Rounds to four decimal places.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests;
