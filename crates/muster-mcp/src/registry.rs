// crates/muster-mcp/src/registry.rs
// ============================================================================
// Module: Tool/Resource/Prompt Registry
// Description: Explicit registration maps with URI-template matching.
// Purpose: Route tool calls, resource reads, and prompt gets to handlers.
// Dependencies: jsonschema, regex, serde_json
// ============================================================================

//! ## Overview
//! Each MCP category is a map from name (or URI) to a small record of
//! description, schema, and handler. Registration is explicit at server
//! construction; there is no reflection. Resource URIs may contain
//! `{placeholder}` segments — each capture matches exactly one path segment
//! (never a `/`), and templates that cannot satisfy that are rejected at
//! registration time. Tool input schemas are compiled once at registration
//! and validate every `tools/call` argument object.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registration errors.
///
/// # Invariants
/// - Registration failures are programming errors surfaced at construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A registration name or URI was already taken.
    #[error("duplicate registration: {0}")]
    Duplicate(String),
    /// A tool input schema failed to compile.
    #[error("invalid input schema for tool '{tool}': {message}")]
    InvalidSchema {
        /// Tool whose schema failed.
        tool: String,
        /// Compiler diagnostic.
        message: String,
    },
    /// A resource URI template is unusable.
    #[error("invalid uri template '{uri}': {message}")]
    InvalidTemplate {
        /// Offending template.
        uri: String,
        /// Rejection reason.
        message: String,
    },
}

/// Handler failure carried back to the dispatcher.
///
/// # Invariants
/// - `payload`, when set, replaces the default `{error, tool}` envelope body.
#[derive(Debug, Clone)]
pub struct HandlerError {
    /// Failure message recorded on the trace span.
    pub message: String,
    /// Optional structured envelope body (domain errors).
    pub payload: Option<Value>,
}

impl HandlerError {
    /// Builds a plain handler failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            payload: None,
        }
    }

    /// Builds a domain not-found failure rendered inside the envelope.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            payload: Some(json!({"error": message, "status": "not_found"})),
            message,
        }
    }
}

// ============================================================================
// SECTION: Handler Types
// ============================================================================

/// Tool handler: structured arguments in, structured result out.
pub type ToolHandler = Box<dyn Fn(&Value) -> Result<Value, HandlerError> + Send + Sync>;

/// Resource handler: URI plus named template captures in, content out.
pub type ResourceHandler =
    Box<dyn Fn(&str, &BTreeMap<String, String>) -> Result<Value, HandlerError> + Send + Sync>;

/// Prompt handler: arguments in, prompt payload out.
pub type PromptHandler = Box<dyn Fn(&Value) -> Result<Value, HandlerError> + Send + Sync>;

// ============================================================================
// SECTION: URI Templates
// ============================================================================

/// Compiled URI template with single-segment named captures.
///
/// # Invariants
/// - Every `{name}` capture matches one path segment (no `/`).
#[derive(Debug)]
pub struct UriTemplate {
    /// Anchored matching regex with named groups.
    regex: Regex,
    /// Capture names in template order.
    names: Vec<String>,
}

impl UriTemplate {
    /// Compiles a template, rejecting shapes that cannot stay single-segment.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidTemplate`] for empty, duplicated, or
    /// slash-containing placeholder names and for unbalanced braces.
    pub fn compile(uri: &str) -> Result<Self, RegistryError> {
        let invalid = |message: &str| RegistryError::InvalidTemplate {
            uri: uri.to_string(),
            message: message.to_string(),
        };
        let mut pattern = String::from("^");
        let mut names = Vec::new();
        let mut rest = uri;
        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            pattern.push_str(&regex::escape(literal));
            let tail = &tail[1..];
            let Some(close) = tail.find('}') else {
                return Err(invalid("unbalanced '{'"));
            };
            let name = &tail[..close];
            if name.is_empty() {
                return Err(invalid("empty placeholder name"));
            }
            if name.contains('/') || name.contains('{') {
                return Err(invalid("placeholder names must be single path segments"));
            }
            if names.iter().any(|existing| existing == name) {
                return Err(invalid("duplicate placeholder name"));
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("placeholder names must be [A-Za-z0-9_]"));
            }
            pattern.push_str(&format!("(?P<{name}>[^/]+)"));
            names.push(name.to_string());
            rest = &tail[close + 1..];
        }
        if rest.contains('}') {
            return Err(invalid("unbalanced '}'"));
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');
        let regex = Regex::new(&pattern)
            .map_err(|err| invalid(&format!("template regex failed: {err}")))?;
        Ok(Self {
            regex,
            names,
        })
    }

    /// Matches a URI, returning named captures on success.
    #[must_use]
    pub fn captures(&self, uri: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.regex.captures(uri)?;
        let mut values = BTreeMap::new();
        for name in &self.names {
            let value = captures.name(name)?;
            values.insert(name.clone(), value.as_str().to_string());
        }
        Some(values)
    }
}

// ============================================================================
// SECTION: Entries
// ============================================================================

/// One registered tool.
pub struct ToolEntry {
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool arguments.
    pub input_schema: Value,
    /// Compiled argument validator.
    validator: Validator,
    /// Invocation handler.
    pub handler: ToolHandler,
}

impl ToolEntry {
    /// Validates an argument object, returning the first violation.
    #[must_use]
    pub fn validate_arguments(&self, arguments: &Value) -> Option<String> {
        self.validator
            .iter_errors(arguments)
            .next()
            .map(|error| format!("{} (at {})", error, error.instance_path()))
    }
}

/// One registered resource.
pub struct ResourceEntry {
    /// Registered URI (possibly templated).
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// MIME type of the resource content.
    pub mime_type: String,
    /// Compiled template when the URI carries placeholders.
    pub template: Option<UriTemplate>,
    /// Read handler.
    pub handler: ResourceHandler,
}

/// One registered prompt.
pub struct PromptEntry {
    /// Human-readable description.
    pub description: String,
    /// Argument descriptors advertised via `prompts/list`.
    pub arguments: Value,
    /// Retrieval handler.
    pub handler: PromptHandler,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registration maps for one MCP server process.
///
/// # Invariants
/// - Maps are owned by the server for the process lifetime.
/// - Resource order is registration order; exact match wins over templates.
#[derive(Default)]
pub struct Registry {
    /// Registered tools by name.
    pub tools: BTreeMap<String, ToolEntry>,
    /// Registered resources in registration order.
    pub resources: Vec<ResourceEntry>,
    /// Registered prompts by name.
    pub prompts: BTreeMap<String, PromptEntry>,
}

impl Registry {
    /// Registers a tool with its input schema and handler.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on duplicate names or uncompilable schemas.
    pub fn register_tool(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: ToolHandler,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        let validator =
            jsonschema::validator_for(&input_schema).map_err(|err| RegistryError::InvalidSchema {
                tool: name.clone(),
                message: err.to_string(),
            })?;
        self.tools.insert(
            name,
            ToolEntry {
                description: description.into(),
                input_schema,
                validator,
                handler,
            },
        );
        Ok(())
    }

    /// Registers a resource; templated URIs compile at registration.
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
        let uri = uri.into();
        if self.resources.iter().any(|entry| entry.uri == uri) {
            return Err(RegistryError::Duplicate(uri));
        }
        let template = if uri.contains('{') || uri.contains('}') {
            Some(UriTemplate::compile(&uri)?)
        } else {
            None
        };
        self.resources.push(ResourceEntry {
            uri,
            name: name.into(),
            description: description.into(),
            mime_type: mime_type.into(),
            template,
            handler,
        });
        Ok(())
    }

    /// Registers a prompt template.
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
        let name = name.into();
        if self.prompts.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.prompts.insert(
            name,
            PromptEntry {
                description: description.into(),
                arguments,
                handler,
            },
        );
        Ok(())
    }

    /// Resolves a resource read: exact URI first, then template matches in
    /// registration order.
    #[must_use]
    pub fn resolve_resource(
        &self,
        uri: &str,
    ) -> Option<(&ResourceEntry, BTreeMap<String, String>)> {
        if let Some(entry) =
            self.resources.iter().find(|entry| entry.template.is_none() && entry.uri == uri)
        {
            return Some((entry, BTreeMap::new()));
        }
        for entry in &self.resources {
            if let Some(template) = &entry.template
                && let Some(captures) = template.captures(uri)
            {
                return Some((entry, captures));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests;
