// crates/muster-reports/src/lib.rs
// ============================================================================
// Module: Muster Reports
// Description: CUI-marked report generation, RTM builder, and SBOM builder.
// Purpose: Render persisted assessment state into deterministic artifacts.
// Dependencies: muster-core, muster-frameworks, regex, serde, serde_yaml, walkdir
// ============================================================================

//! ## Overview
//! Every artifact this crate emits is deterministic over the persisted rows
//! it reads (modulo caller-supplied timestamps) and carries CUI banners at
//! the top and bottom unless the text is already marked. Report versions
//! come from audit-event counts, never from wall-clock or random state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cui;
pub mod frameworks;
pub mod generator;
pub mod rtm;
pub mod sbom;
pub mod stig_report;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use cui::CuiConfig;
pub use generator::ReportError;
pub use generator::ReportOutput;
pub use generator::generate_report;
pub use rtm::RtmOutput;
pub use rtm::generate_rtm;
pub use sbom::SbomOutput;
pub use sbom::generate_sbom;
pub use stig_report::generate_stig_checklist;
