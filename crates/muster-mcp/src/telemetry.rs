// crates/muster-mcp/src/telemetry.rs
// ============================================================================
// Module: MCP Telemetry
// Description: Trace span model and pluggable sink for tool invocations.
// Purpose: Record spans around tool calls without hard exporter dependencies.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module exposes a thin tracing interface for MCP tool-call spans. It
//! is intentionally dependency-light so deployments can plug in an
//! OpenTelemetry exporter without redesign. A process-wide sink is
//! installed with [`init_tracer`]; [`tracer`] returns the installed sink or
//! a no-op, and every call site tolerates the no-op case. Sinks must never
//! block the dispatcher: export failures are swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;

use serde::Serialize;

// ============================================================================
// SECTION: Span Model
// ============================================================================

/// Span kind label.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpanKind {
    /// Server-side handling of an inbound request.
    #[serde(rename = "SERVER")]
    Server,
    /// Internal operation.
    #[serde(rename = "INTERNAL")]
    Internal,
}

/// Span status label.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpanStatus {
    /// Status not set.
    #[serde(rename = "UNSET")]
    Unset,
    /// Operation succeeded.
    #[serde(rename = "OK")]
    Ok,
    /// Operation failed.
    #[serde(rename = "ERROR")]
    Error,
}

/// One span event (e.g. a recorded exception).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanEvent {
    /// Event name.
    pub name: String,
    /// Event attributes.
    pub attributes: BTreeMap<String, String>,
}

/// One completed span record delivered to the sink.
///
/// # Invariants
/// - Attributes avoid raw tool arguments; only hashes are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanRecord {
    /// Span name (`mcp.tool_call`).
    pub name: String,
    /// Span kind.
    pub kind: SpanKind,
    /// Span attributes.
    pub attributes: BTreeMap<String, String>,
    /// Final status.
    pub status: SpanStatus,
    /// Status message for failed spans.
    pub status_message: Option<String>,
    /// Recorded events.
    pub events: Vec<SpanEvent>,
}

/// In-progress span builder.
///
/// # Invariants
/// - `end` delivers the record exactly once.
#[derive(Debug)]
pub struct SpanBuilder {
    /// Record under construction.
    record: SpanRecord,
}

impl SpanBuilder {
    /// Starts a span with a name, kind, and initial attributes.
    #[must_use]
    pub fn start(
        name: impl Into<String>,
        kind: SpanKind,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            record: SpanRecord {
                name: name.into(),
                kind,
                attributes,
                status: SpanStatus::Unset,
                status_message: None,
                events: Vec::new(),
            },
        }
    }

    /// Adds one attribute to the span.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.record.attributes.insert(key.into(), value.into());
    }

    /// Sets the final status with an optional message.
    pub fn set_status(&mut self, status: SpanStatus, message: Option<String>) {
        self.record.status = status;
        self.record.status_message = message;
    }

    /// Adds one event to the span.
    pub fn add_event(&mut self, name: impl Into<String>, attributes: BTreeMap<String, String>) {
        self.record.events.push(SpanEvent {
            name: name.into(),
            attributes,
        });
    }

    /// Ends the span and delivers it to the sink.
    pub fn end(self, sink: &dyn TraceSink) {
        sink.record_span(self.record);
    }
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Trace sink for completed spans.
///
/// Implementations must not block the dispatcher: export failures are
/// swallowed (reported on stderr by the implementation when useful).
pub trait TraceSink: Send + Sync {
    /// Records one completed span.
    fn record_span(&self, span: SpanRecord);
}

/// No-op trace sink.
///
/// # Invariants
/// - Spans are intentionally discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn record_span(&self, _span: SpanRecord) {}
}

/// In-memory sink used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    /// Recorded spans.
    spans: Mutex<Vec<SpanRecord>>,
}

impl MemoryTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded spans.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SpanRecord> {
        self.spans.lock().map(|spans| spans.clone()).unwrap_or_default()
    }
}

impl TraceSink for MemoryTraceSink {
    fn record_span(&self, span: SpanRecord) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.push(span);
        }
    }
}

// ============================================================================
// SECTION: Process-wide Installation
// ============================================================================

/// Process-wide installed sink; `None` until [`init_tracer`] runs.
static INSTALLED: RwLock<Option<Arc<dyn TraceSink>>> = RwLock::new(None);

/// Installs the process-wide trace sink.
pub fn init_tracer(sink: Arc<dyn TraceSink>) {
    if let Ok(mut installed) = INSTALLED.write() {
        *installed = Some(sink);
    }
}

/// Returns the installed sink, or a no-op sink when uninstalled.
#[must_use]
pub fn tracer() -> Arc<dyn TraceSink> {
    INSTALLED
        .read()
        .ok()
        .and_then(|installed| installed.clone())
        .unwrap_or_else(|| Arc::new(NoopTraceSink))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::MemoryTraceSink;
    use super::SpanBuilder;
    use super::SpanKind;
    use super::SpanStatus;

    #[test]
    fn span_builder_delivers_one_record() {
        let sink = MemoryTraceSink::new();
        let mut span = SpanBuilder::start("mcp.tool_call", SpanKind::Server, BTreeMap::new());
        span.set_attribute("mcp.tool.name", "echo");
        span.set_status(SpanStatus::Ok, None);
        span.end(&sink);

        let spans = sink.snapshot();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "mcp.tool_call");
        assert_eq!(spans[0].kind, SpanKind::Server);
        assert_eq!(spans[0].status, SpanStatus::Ok);
        assert_eq!(spans[0].attributes.get("mcp.tool.name").map(String::as_str), Some("echo"));
    }

    #[test]
    fn error_spans_carry_exception_events() {
        let sink = MemoryTraceSink::new();
        let mut span = SpanBuilder::start("mcp.tool_call", SpanKind::Server, BTreeMap::new());
        let mut attributes = BTreeMap::new();
        attributes.insert("exception.type".to_string(), "HandlerError".to_string());
        attributes.insert("exception.message".to_string(), "boom".to_string());
        span.add_event("exception", attributes);
        span.set_status(SpanStatus::Error, Some("boom".to_string()));
        span.end(&sink);

        let spans = sink.snapshot();
        assert_eq!(spans[0].events.len(), 1);
        assert_eq!(spans[0].events[0].name, "exception");
        assert_eq!(spans[0].status_message.as_deref(), Some("boom"));
    }
}
