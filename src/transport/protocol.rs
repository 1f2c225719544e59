//! Engine wire protocol types and response normalization

use serde::Serialize;
use serde_json::Value;

/// Request frame sent to the engine.
///
/// Serialized as `{"type": ..., "params": ...}` with no length prefix or
/// delimiter; the engine infers completeness the same way we do on the
/// response side.
#[derive(Debug, Clone, Serialize)]
pub struct EngineCommand {
    /// Command name, forwarded verbatim
    #[serde(rename = "type")]
    pub command_type: String,
    /// Opaque command parameters, forwarded verbatim
    pub params: Value,
}

impl EngineCommand {
    /// Create a new command frame
    pub fn new(command_type: impl Into<String>, params: Value) -> Self {
        Self {
            command_type: command_type.into(),
            params,
        }
    }
}

/// Normalized engine response.
///
/// The engine answers in two shapes: `{"status": "success"|"error", ...}`
/// or `{"success": bool, "error"|"message": ...}`. Both are accepted on
/// ingress and collapsed to this single canonical form so upstream
/// consumers never see the difference.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineResponse {
    /// Success payload with `status` guaranteed present
    Success(Value),
    /// Failure with a human-readable message
    Error { message: String },
}

impl EngineResponse {
    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Normalize a raw engine payload into the canonical shape
    pub fn normalize(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            // Non-object payloads happen only through the salvage parse
            // path; pass them through untouched.
            return Self::Success(value);
        };

        let is_error = fields.get("status").and_then(Value::as_str) == Some("error")
            || fields.get("success").and_then(Value::as_bool) == Some(false);

        if is_error {
            let message = fields
                .get("error")
                .or_else(|| fields.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown engine error")
                .to_string();
            return Self::Error { message };
        }

        fields.remove("success");
        fields
            .entry("status")
            .or_insert_with(|| Value::String("success".to_string()));
        Self::Success(Value::Object(fields))
    }

    /// Whether the exchange succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure message, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error { message } => Some(message),
        }
    }

    /// Canonical JSON form: the success payload, or
    /// `{"status": "error", "error": ...}`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Success(value) => value,
            Self::Error { message } => serde_json::json!({
                "status": "error",
                "error": message,
            }),
        }
    }
}

/// Bounded preview of a JSON payload for logging.
///
/// Command parameters are opaque and can be large; logs carry at most
/// `max_len` bytes of them.
pub fn payload_preview(value: &Value, max_len: usize) -> String {
    let mut preview = value.to_string();
    if preview.len() > max_len {
        let mut end = max_len;
        while !preview.is_char_boundary(end) {
            end -= 1;
        }
        preview.truncate(end);
        preview.push_str("...");
    }
    preview
}
