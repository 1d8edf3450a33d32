// crates/muster-mcp/src/lib.rs
// ============================================================================
// Module: Muster MCP
// Description: JSON-RPC 2.0 stdio servers exposing the compliance platform.
// Purpose: Frame, dispatch, and trace MCP tool/resource/prompt invocations.
// Dependencies: jsonschema, muster-config, muster-core, muster-frameworks,
//               muster-reports, muster-store-sqlite, regex, serde, serde_json
// ============================================================================

//! ## Overview
//! Each Muster MCP server is a single process with a strictly sequential
//! dispatcher loop: read one Content-Length-framed JSON-RPC message from
//! stdin, dispatch it, write the response to stdout, repeat. stdout carries
//! only framed protocol bytes; all diagnostics go to stderr. Tool calls are
//! wrapped in a `mcp.tool_call` trace span; the tracer is an abstract sink
//! that tolerates absence silently.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod framing;
pub mod registry;
pub mod rpc;
pub mod server;
pub mod servers;
pub mod telemetry;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use registry::HandlerError;
pub use registry::Registry;
pub use registry::RegistryError;
pub use server::McpServer;
pub use server::ServeError;
pub use servers::compliance::build_compliance_server;
pub use servers::requirements::build_requirements_server;
pub use telemetry::MemoryTraceSink;
pub use telemetry::NoopTraceSink;
pub use telemetry::TraceSink;
pub use telemetry::init_tracer;
pub use telemetry::tracer;
