// crates/muster-core/src/clarify/tests.rs
// ============================================================================
// Module: Clarification Engine Tests
// Description: Matrix coverage, classification rules, and question selection.
// Purpose: Pin the deterministic prioritization behavior.
// Dependencies: serde_json
// ============================================================================

use serde_json::json;

use super::AmbiguityPattern;
use super::ClarifyContext;
use super::ClarifyItem;
use super::DEFAULT_MAX_QUESTIONS;
use super::Impact;
use super::Uncertainty;
use super::analyze_requirement_rows;
use super::analyze_spec_text;
use super::find_hedging_word;
use super::generate_question;
use super::load_ambiguity_patterns;
use super::matrix_entries;
use super::matrix_priority;
use super::parse_spec_sections;
use super::prioritize;
use super::score_impact;
use super::score_uncertainty;
use crate::core::identifiers::SessionId;
use crate::interfaces::IntakeRequirement;

/// Sample ambiguity patterns used across tests.
fn patterns() -> Vec<AmbiguityPattern> {
    vec![AmbiguityPattern {
        phrase: "as fast as possible".to_string(),
        clarification: "Specify a measurable latency target.".to_string(),
    }]
}

#[test]
fn matrix_covers_all_nine_cells() {
    let entries = matrix_entries();
    assert_eq!(entries.len(), 9);
    assert_eq!(matrix_priority(Impact::MissionCritical, Uncertainty::Unknown), 1);
    assert_eq!(matrix_priority(Impact::Enhancement, Uncertainty::Assumed), 5);
    assert_eq!(matrix_priority(Impact::ComplianceRequired, Uncertainty::Unknown), 2);
    assert_eq!(matrix_priority(Impact::Enhancement, Uncertainty::Unknown), 3);
}

#[test]
fn impact_keywords_win_over_context() {
    assert_eq!(score_impact("warfighter mission planning", None), Impact::MissionCritical);
    assert_eq!(score_impact("must satisfy NIST AU-2 audit", None), Impact::ComplianceRequired);
    assert_eq!(score_impact("nicer colors in the dashboard", None), Impact::Enhancement);

    let context = ClarifyContext {
        requirement_type: Some("security".to_string()),
    };
    assert_eq!(
        score_impact("nicer colors in the dashboard", Some(&context)),
        Impact::ComplianceRequired
    );
    let context = ClarifyContext {
        requirement_type: Some("infrastructure".to_string()),
    };
    assert_eq!(
        score_impact("nicer colors in the dashboard", Some(&context)),
        Impact::MissionCritical
    );
}

#[test]
fn uncertainty_rules_apply_in_order() {
    assert_eq!(score_uncertainty("", &patterns()), Uncertainty::Unknown);
    assert_eq!(score_uncertainty("too short", &patterns()), Uncertainty::Unknown);
    assert_eq!(
        score_uncertainty(
            "The service responds as fast as possible to every request from every client.",
            &patterns()
        ),
        Uncertainty::Ambiguous
    );
    assert_eq!(
        score_uncertainty(
            "The importer should retry failed batches with exponential backoff until done.",
            &patterns()
        ),
        Uncertainty::Assumed
    );
    assert_eq!(
        score_uncertainty(
            "The importer retries failed batches with exponential backoff until finished.",
            &patterns()
        ),
        Uncertainty::Assumed
    );
}

#[test]
fn hedge_word_scan_is_deterministic() {
    // Both "should" and "may" appear; the declared order puts "should" first.
    assert_eq!(
        find_hedging_word("Clients should retry and may give up."),
        Some("should")
    );
    assert_eq!(find_hedging_word("Clients retry exactly three times."), None);
}

#[test]
fn question_styles_match_uncertainty() {
    let unknown = generate_question("Testing Strategy", Uncertainty::Unknown, "", None);
    assert!(unknown.contains("appears incomplete or empty"));
    assert!(unknown.contains("testing strategy"));

    let pattern = &patterns()[0];
    let ambiguous = generate_question(
        "Performance",
        Uncertainty::Ambiguous,
        "respond as fast as possible",
        Some(pattern),
    );
    assert!(ambiguous.contains("'as fast as possible'"));
    assert!(ambiguous.contains("measurable latency target"));

    let assumed = generate_question(
        "Retries",
        Uncertainty::Assumed,
        "The importer should retry failed batches.",
        None,
    );
    assert!(assumed.contains("'should'"));
    assert!(assumed.contains("MUST"));
    assert!(assumed.contains("SHOULD"));
}

#[test]
fn prioritize_orders_by_priority_then_impact_then_section() {
    let item = |section: &str, impact: Impact, uncertainty: Uncertainty| ClarifyItem {
        section: section.to_string(),
        impact,
        uncertainty,
        priority: matrix_priority(impact, uncertainty),
        question: String::new(),
        context: String::new(),
        requirement_id: None,
    };
    let items = vec![
        item("Zeta", Impact::Enhancement, Uncertainty::Unknown),
        item("Alpha", Impact::Enhancement, Uncertainty::Unknown),
        item("Beta", Impact::MissionCritical, Uncertainty::Assumed),
        item("Gamma", Impact::MissionCritical, Uncertainty::Unknown),
    ];
    let ordered = prioritize(items, DEFAULT_MAX_QUESTIONS);
    let sections: Vec<&str> = ordered.iter().map(|i| i.section.as_str()).collect();
    // P1 Gamma, then the three P3 items: mission-critical Beta first, then
    // the enhancement items alphabetically.
    assert_eq!(sections, vec!["Gamma", "Beta", "Alpha", "Zeta"]);
}

#[test]
fn vague_spec_yields_enhancement_unknown_question() {
    let analysis = analyze_spec_text(
        "## Feature Description\nWe need to do something.\n",
        &[],
        DEFAULT_MAX_QUESTIONS,
    );
    assert_eq!(analysis.status, "ok");
    assert!(!analysis.questions.is_empty());
    assert!(analysis.questions.iter().any(|q| {
        q.section == "Feature Description"
            && q.impact == Impact::Enhancement
            && q.uncertainty == Uncertainty::Unknown
            && q.priority == 3
    }));
    // Missing required sections are injected as unknown items.
    assert!(analysis.total_issues_found > 1);
    assert!(analysis.clarity_score < 0.1);
}

#[test]
fn spec_sections_parse_with_preamble() {
    let sections = parse_spec_sections("intro text\n## A\nbody a\n## B\nbody b");
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0].0, "_preamble");
    assert_eq!(sections[1], ("A".to_string(), "body a".to_string()));
    assert_eq!(sections[2], ("B".to_string(), "body b".to_string()));
}

#[test]
fn session_rows_use_context_and_stored_scores() {
    let row = |id: &str, text: &str, rtype: &str, completeness: Option<f64>| IntakeRequirement {
        id: id.to_string(),
        session_id: SessionId::new("sess-1"),
        raw_text: text.to_string(),
        requirement_type: rtype.to_string(),
        clarity_score: None,
        completeness_score: completeness,
    };
    let rows = vec![
        // Assumed text with low completeness is promoted to a candidate.
        row(
            "r1",
            "The exporter should emit well formed records for all downstream consumers.",
            "functional",
            Some(0.3),
        ),
        // Short text is unknown; security type makes it compliance_required.
        row("r2", "encrypt things", "security", None),
        // Clean row produces no question.
        row(
            "r3",
            "The ledger writes one immutable row per transfer and keeps them forever.",
            "functional",
            None,
        ),
    ];
    let analysis = analyze_requirement_rows(&rows, &[], DEFAULT_MAX_QUESTIONS);
    assert_eq!(analysis.total_items_analyzed, 3);
    assert_eq!(analysis.total_issues_found, 2);
    let first = &analysis.questions[0];
    // (compliance_required, unknown) = priority 2 sorts first.
    assert_eq!(first.requirement_id.as_deref(), Some("r2"));
    assert_eq!(first.impact, Impact::ComplianceRequired);
    assert_eq!(first.priority, 2);
    let second = &analysis.questions[1];
    assert_eq!(second.requirement_id.as_deref(), Some("r1"));
    assert_eq!(second.uncertainty, Uncertainty::Assumed);
}

#[test]
fn pattern_documents_load_gracefully() {
    let document = json!({
        "ambiguity_patterns": [
            {"phrase": "as fast as possible", "clarification": "Name a latency target."},
            {"phrase": ""},
            {"clarification": "orphan"},
            {"phrase": "user friendly"}
        ]
    });
    let loaded = load_ambiguity_patterns(&document);
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].phrase, "as fast as possible");
    assert_eq!(loaded[1].clarification, "provide a measurable definition");
    assert!(load_ambiguity_patterns(&json!({})).is_empty());
}
