// crates/muster-mcp/src/server.rs
// ============================================================================
// Module: MCP Server Dispatch
// Description: Sequential JSON-RPC dispatcher with lifecycle and tracing.
// Purpose: Route framed messages to registered handlers, one at a time.
// Dependencies: crate::framing, crate::registry, crate::rpc, crate::telemetry
// ============================================================================

//! ## Overview
//! The dispatcher is strictly sequential: the next message is not read until
//! the previous response (if any) is written. For each request with an id,
//! exactly one response is written; notifications produce none. Handler
//! failures never terminate the loop — they become envelope errors
//! (`tools/call`) or JSON-RPC internal errors (everything else). Each tool
//! call is wrapped in a SERVER-kind `mcp.tool_call` span carrying argument
//! and result hashes instead of raw values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::BufRead;
use std::io::Write;
use std::sync::Arc;

use muster_core::hashing;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::framing;
use crate::framing::ReadOutcome;
use crate::registry::HandlerError;
use crate::registry::PromptHandler;
use crate::registry::Registry;
use crate::registry::RegistryError;
use crate::registry::ResourceHandler;
use crate::registry::ToolHandler;
use crate::rpc;
use crate::rpc::RequestView;
use crate::telemetry::SpanBuilder;
use crate::telemetry::SpanKind;
use crate::telemetry::SpanStatus;
use crate::telemetry::TraceSink;
use crate::telemetry::tracer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MCP protocol version advertised in the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal serve-loop errors.
///
/// # Invariants
/// - Only transport failures are fatal; handler failures never are.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Transport failure on stdin or stdout.
    #[error("serve io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// One MCP server process: identity, registrations, and session state.
///
/// # Invariants
/// - The server owns its registration maps for the process lifetime.
/// - `initialized` tracks the lifecycle notification but is never required:
///   clients that skip `notifications/initialized` are tolerated.
pub struct McpServer {
    /// Server name advertised in the handshake and span attributes.
    name: String,
    /// Server version advertised in the handshake.
    version: String,
    /// Registered tools, resources, and prompts.
    registry: Registry,
    /// Whether the client sent `notifications/initialized`.
    initialized: bool,
    /// Explicit trace sink override; falls back to the process-wide sink.
    trace_sink: Option<Arc<dyn TraceSink>>,
}

impl McpServer {
    /// Creates a server with the given identity.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            registry: Registry::default(),
            initialized: false,
            trace_sink: None,
        }
    }

    /// Returns the server name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the initialized notification has arrived.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Overrides the trace sink (used by embedding hosts and tests).
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on duplicate names or invalid schemas.
    pub fn register_tool(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: ToolHandler,
    ) -> Result<(), RegistryError> {
        self.registry.register_tool(name, description, input_schema, handler)
    }

    /// Registers a resource.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on duplicate URIs or invalid templates.
    pub fn register_resource(
        &mut self,
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        mime_type: impl Into<String>,
        handler: ResourceHandler,
    ) -> Result<(), RegistryError> {
        self.registry.register_resource(uri, name, description, mime_type, handler)
    }

    /// Registers a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] on duplicate names.
    pub fn register_prompt(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        arguments: Value,
        handler: PromptHandler,
    ) -> Result<(), RegistryError> {
        self.registry.register_prompt(name, description, arguments, handler)
    }

    /// Returns the active trace sink.
    fn sink(&self) -> Arc<dyn TraceSink> {
        self.trace_sink.clone().unwrap_or_else(tracer)
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Handles one inbound message, returning the response to write.
    ///
    /// Notifications return `None`. Requests (messages carrying an `id`
    /// key) always return exactly one response value.
    pub fn handle_message(&mut self, message: &Value) -> Option<Value> {
        if RequestView::missing_method(message) {
            if RequestView::has_id(message) {
                let id = message.get("id").cloned().unwrap_or(Value::Null);
                return Some(rpc::error_response(
                    id,
                    rpc::INVALID_REQUEST,
                    "Missing 'method' field",
                    None,
                ));
            }
            return None;
        }
        let view = RequestView::over(message)?;
        let method = view.method.to_string();
        let params = view.params.clone();
        let id = view.id.clone();
        let is_notification = view.is_notification;

        let result = self.handle_method(&method, &params);
        if is_notification {
            return None;
        }
        Some(match result {
            Ok(result) => rpc::response(id, result),
            Err(dispatch) => rpc::error_response(id, dispatch.code, &dispatch.message, dispatch.data),
        })
    }

    /// Routes a method to its handler.
    fn handle_method(&mut self, method: &str, params: &Value) -> Result<Value, DispatchError> {
        match method {
            "initialize" => Ok(self.handle_initialize()),
            "notifications/initialized" => {
                self.initialized = true;
                Ok(Value::Null)
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(params),
            "resources/list" => Ok(self.handle_resources_list()),
            "resources/read" => self.handle_resources_read(params),
            "prompts/list" => Ok(self.handle_prompts_list()),
            "prompts/get" => self.handle_prompts_get(params),
            other => Err(DispatchError {
                code: rpc::METHOD_NOT_FOUND,
                message: format!("Unknown method: {other}"),
                data: None,
            }),
        }
    }

    /// Handles the initialize handshake.
    fn handle_initialize(&self) -> Value {
        let mut capabilities = serde_json::Map::new();
        if !self.registry.tools.is_empty() {
            capabilities.insert("tools".to_string(), json!({"listChanged": false}));
        }
        if !self.registry.resources.is_empty() {
            capabilities.insert(
                "resources".to_string(),
                json!({"subscribe": false, "listChanged": false}),
            );
        }
        if !self.registry.prompts.is_empty() {
            capabilities.insert("prompts".to_string(), json!({"listChanged": false}));
        }
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": Value::Object(capabilities),
            "serverInfo": {
                "name": self.name,
                "version": self.version,
            },
        })
    }

    /// Handles `tools/list`.
    fn handle_tools_list(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .tools
            .iter()
            .map(|(name, entry)| {
                json!({
                    "name": name,
                    "description": entry.description,
                    "inputSchema": entry.input_schema,
                })
            })
            .collect();
        json!({"tools": tools})
    }

    /// Handles `tools/call` with span instrumentation.
    fn handle_tools_call(&self, params: &Value) -> Result<Value, DispatchError> {
        let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
            return Err(DispatchError {
                code: rpc::INVALID_PARAMS,
                message: "missing required parameter".to_string(),
                data: Some(json!({"field": "name"})),
            });
        };
        let default_arguments = json!({});
        let arguments = params.get("arguments").unwrap_or(&default_arguments);

        let Some(entry) = self.registry.tools.get(tool_name) else {
            return Err(DispatchError {
                code: rpc::METHOD_NOT_FOUND,
                message: format!("Unknown tool: {tool_name}"),
                data: None,
            });
        };
        if let Some(violation) = entry.validate_arguments(arguments) {
            return Err(DispatchError {
                code: rpc::INVALID_PARAMS,
                message: format!("invalid arguments for tool '{tool_name}'"),
                data: Some(json!({"field": violation})),
            });
        }

        let sink = self.sink();
        let args_hash = hashing::short_canonical_digest(arguments).unwrap_or_default();
        let mut attributes = BTreeMap::new();
        attributes.insert("gen_ai.operation.name".to_string(), "execute_tool".to_string());
        attributes.insert("mcp.tool.name".to_string(), tool_name.to_string());
        attributes.insert("mcp.server.name".to_string(), self.name.clone());
        attributes.insert("mcp.tool.args_hash".to_string(), args_hash);
        let mut span = SpanBuilder::start("mcp.tool_call", SpanKind::Server, attributes);

        match (entry.handler)(arguments) {
            Ok(result) => {
                let text = serialize_result(&result);
                span.set_attribute("mcp.tool.result_hash", hashing::short_digest(text.as_bytes()));
                span.set_status(SpanStatus::Ok, None);
                span.end(sink.as_ref());
                Ok(json!({
                    "content": [{"type": "text", "text": text}],
                    "isError": false,
                }))
            }
            Err(error) => {
                let mut event_attributes = BTreeMap::new();
                event_attributes
                    .insert("exception.type".to_string(), "HandlerError".to_string());
                event_attributes.insert("exception.message".to_string(), error.message.clone());
                span.add_event("exception", event_attributes);
                span.set_status(SpanStatus::Error, Some(error.message.clone()));
                span.end(sink.as_ref());
                let body = error
                    .payload
                    .unwrap_or_else(|| json!({"error": error.message, "tool": tool_name}));
                let text = serde_json::to_string_pretty(&body)
                    .unwrap_or_else(|_| error.message.clone());
                Ok(json!({
                    "content": [{"type": "text", "text": text}],
                    "isError": true,
                }))
            }
        }
    }

    /// Handles `resources/list`.
    fn handle_resources_list(&self) -> Value {
        let resources: Vec<Value> = self
            .registry
            .resources
            .iter()
            .map(|entry| {
                json!({
                    "uri": entry.uri,
                    "name": entry.name,
                    "description": entry.description,
                    "mimeType": entry.mime_type,
                })
            })
            .collect();
        json!({"resources": resources})
    }

    /// Handles `resources/read` with exact-then-template resolution.
    fn handle_resources_read(&self, params: &Value) -> Result<Value, DispatchError> {
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return Err(DispatchError {
                code: rpc::INVALID_PARAMS,
                message: "missing required parameter".to_string(),
                data: Some(json!({"field": "uri"})),
            });
        };
        let Some((entry, captures)) = self.registry.resolve_resource(uri) else {
            return Err(DispatchError {
                code: rpc::METHOD_NOT_FOUND,
                message: format!("Unknown resource URI: {uri}"),
                data: None,
            });
        };
        let content = (entry.handler)(uri, &captures).map_err(DispatchError::internal)?;
        let text = serialize_result(&content);
        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": entry.mime_type,
                "text": text,
            }],
        }))
    }

    /// Handles `prompts/list`.
    fn handle_prompts_list(&self) -> Value {
        let prompts: Vec<Value> = self
            .registry
            .prompts
            .iter()
            .map(|(name, entry)| {
                json!({
                    "name": name,
                    "description": entry.description,
                    "arguments": entry.arguments,
                })
            })
            .collect();
        json!({"prompts": prompts})
    }

    /// Handles `prompts/get`, normalizing handler results into messages.
    fn handle_prompts_get(&self, params: &Value) -> Result<Value, DispatchError> {
        let Some(prompt_name) = params.get("name").and_then(Value::as_str) else {
            return Err(DispatchError {
                code: rpc::INVALID_PARAMS,
                message: "missing required parameter".to_string(),
                data: Some(json!({"field": "name"})),
            });
        };
        let default_arguments = json!({});
        let arguments = params.get("arguments").unwrap_or(&default_arguments);
        let Some(entry) = self.registry.prompts.get(prompt_name) else {
            return Err(DispatchError {
                code: rpc::METHOD_NOT_FOUND,
                message: format!("Unknown prompt: {prompt_name}"),
                data: None,
            });
        };
        let result = (entry.handler)(arguments).map_err(DispatchError::internal)?;

        // Full prompt payloads pass through unchanged.
        if result.get("messages").is_some() {
            return Ok(result);
        }
        let text = match &result {
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        Ok(json!({
            "description": entry.description,
            "messages": [{
                "role": "user",
                "content": {"type": "text", "text": text},
            }],
        }))
    }

    // ------------------------------------------------------------------
    // Main loop
    // ------------------------------------------------------------------

    /// Runs the sequential dispatcher loop until EOF.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Io`] on transport failures; the caller maps
    /// this to exit code 1.
    pub fn run(
        &mut self,
        reader: &mut impl BufRead,
        writer: &mut impl Write,
    ) -> Result<(), ServeError> {
        loop {
            let outcome =
                framing::read_message(reader).map_err(|err| ServeError::Io(err.to_string()))?;
            match outcome {
                ReadOutcome::Eof => return Ok(()),
                ReadOutcome::Malformed(message) => {
                    let response = rpc::error_response(
                        Value::Null,
                        rpc::PARSE_ERROR,
                        "Parse error",
                        Some(json!(message)),
                    );
                    framing::write_message(writer, &response)
                        .map_err(|err| ServeError::Io(err.to_string()))?;
                }
                ReadOutcome::Message(message) => {
                    if let Some(response) = self.handle_message(&message) {
                        framing::write_message(writer, &response)
                            .map_err(|err| ServeError::Io(err.to_string()))?;
                    }
                }
            }
        }
    }

    /// Runs the dispatcher over locked stdin/stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Io`] on transport failures.
    pub fn serve_stdio(&mut self) -> Result<(), ServeError> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let mut reader = stdin.lock();
        let mut writer = stdout.lock();
        self.run(&mut reader, &mut writer)
    }
}

// ============================================================================
// SECTION: Internal Dispatch Error
// ============================================================================

/// Dispatch-level error mapped to a JSON-RPC error response.
#[derive(Debug)]
struct DispatchError {
    /// JSON-RPC error code.
    code: i64,
    /// Error message.
    message: String,
    /// Optional structured diagnostic data.
    data: Option<Value>,
}

impl DispatchError {
    /// Wraps a handler failure as an internal error with diagnostic data.
    fn internal(error: HandlerError) -> Self {
        Self {
            code: rpc::INTERNAL_ERROR,
            message: error.message.clone(),
            data: Some(json!(format!("handler error: {}", error.message))),
        }
    }
}

// ============================================================================
// SECTION: Result Serialization
// ============================================================================

/// Normalizes a handler result into envelope text.
///
/// Strings pass through; objects and arrays (and everything else) are
/// pretty-serialized JSON.
fn serialize_result(result: &Value) -> String {
    match result {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
