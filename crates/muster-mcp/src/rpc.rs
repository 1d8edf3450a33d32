// crates/muster-mcp/src/rpc.rs
// ============================================================================
// Module: JSON-RPC 2.0 Types
// Description: Message views, response builders, and standard error codes.
// Purpose: Keep the wire vocabulary in one place for the dispatcher.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Inbound messages are handled as raw JSON values with a thin request view
//! over them; responses are built as values so the framing layer can write
//! them compactly. Error codes follow JSON-RPC 2.0: parse, invalid request,
//! method not found, invalid params, internal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Parse error: invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// Invalid request: the JSON is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// Method not found (also used for unknown tools and resources).
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// ============================================================================
// SECTION: Request View
// ============================================================================

/// Borrowed view over one inbound JSON-RPC message.
///
/// # Invariants
/// - `is_notification` is true exactly when the `id` key is absent.
#[derive(Debug, Clone)]
pub struct RequestView<'a> {
    /// Method name; empty when absent.
    pub method: &'a str,
    /// Request params; `Null` when absent.
    pub params: &'a Value,
    /// Request id; `Null` when absent or explicitly null.
    pub id: Value,
    /// Whether the message is a notification (no `id` key).
    pub is_notification: bool,
}

/// Shared empty-params value for requests without params.
static NULL_PARAMS: Value = Value::Null;

impl<'a> RequestView<'a> {
    /// Builds a request view over a parsed message object.
    ///
    /// Returns `None` when the message is not a JSON object.
    #[must_use]
    pub fn over(message: &'a Value) -> Option<Self> {
        let object = message.as_object()?;
        let method = object.get("method").and_then(Value::as_str).unwrap_or("");
        let params = object.get("params").unwrap_or(&NULL_PARAMS);
        let is_notification = !object.contains_key("id");
        let id = object.get("id").cloned().unwrap_or(Value::Null);
        Some(Self {
            method,
            params,
            id,
            is_notification,
        })
    }

    /// Returns true when the message carries no `method` field.
    #[must_use]
    pub fn missing_method(message: &Value) -> bool {
        message.as_object().is_none_or(|object| !object.contains_key("method"))
    }

    /// Returns true when the message carries an `id` key.
    #[must_use]
    pub fn has_id(message: &Value) -> bool {
        message.as_object().is_some_and(|object| object.contains_key("id"))
    }
}

// ============================================================================
// SECTION: Response Builders
// ============================================================================

/// Builds a success response for a request id.
#[must_use]
pub fn response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds an error response for a request id.
#[must_use]
pub fn error_response(id: Value, code: i64, message: &str, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message,
    });
    if let Some(data) = data
        && let Some(object) = error.as_object_mut()
    {
        object.insert("data".to_string(), data);
    }
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use serde_json::json;

    use super::RequestView;
    use super::error_response;
    use super::response;

    #[test]
    fn view_distinguishes_notifications_from_null_ids() {
        let request = json!({"jsonrpc": "2.0", "id": null, "method": "ping"});
        let view = RequestView::over(&request).map(|v| v.is_notification);
        assert_eq!(view, Some(false));

        let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let view = RequestView::over(&notification).map(|v| v.is_notification);
        assert_eq!(view, Some(true));
    }

    #[test]
    fn missing_method_detection() {
        assert!(RequestView::missing_method(&json!({"id": 1})));
        assert!(!RequestView::missing_method(&json!({"id": 1, "method": "ping"})));
        assert!(RequestView::missing_method(&json!([1, 2, 3])));
    }

    #[test]
    fn error_response_carries_optional_data() {
        let with_data = error_response(json!(7), super::INVALID_PARAMS, "bad", Some(json!("f")));
        assert_eq!(with_data["error"]["data"], json!("f"));
        let without = error_response(Value::Null, super::PARSE_ERROR, "bad", None);
        assert!(without["error"].get("data").is_none());
        assert_eq!(without["id"], Value::Null);
    }

    #[test]
    fn response_echoes_the_request_id() {
        let built = response(json!("abc"), json!({}));
        assert_eq!(built["id"], json!("abc"));
        assert_eq!(built["jsonrpc"], json!("2.0"));
    }
}
