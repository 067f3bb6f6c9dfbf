//! What a host sees of a tool: its definition, its result shape and the
//! trait it calls through.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name, description and JSON-schema parameters advertised to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name callers invoke the tool by
    pub name: String,
    /// Prose shown to the caller
    pub description: String,
    /// JSON schema of the input object
    pub parameters: Value,
    /// Disabled tools answer every call with a failure result
    pub enabled: bool,
}

impl ToolDefinition {
    /// Enabled definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            enabled: true,
        }
    }

    /// Set enabled status
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Outcome of one call. `error` is set exactly when `success` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the call succeeded
    pub success: bool,
    /// Response body
    pub output: Value,
    /// Short failure summary
    pub error: Option<String>,
    /// Wall time of the call
    pub duration_ms: u64,
}

impl ToolResult {
    /// Successful call
    #[must_use]
    pub fn success(output: Value, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration_ms,
        }
    }

    /// Failed call with no body
    #[must_use]
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self::failure_with_output(error, Value::Null, duration_ms)
    }

    /// Failed call that still returns a structured body (a capture failure
    /// carries its code, recovery hint and corrected steps)
    #[must_use]
    pub fn failure_with_output(error: impl Into<String>, output: Value, duration_ms: u64) -> Self {
        Self {
            success: false,
            output,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// A callable tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Advertised definition
    fn definition(&self) -> &ToolDefinition;

    /// Run one call. `Err` is reserved for input the tool cannot parse;
    /// failures of the call itself come back as a failed [`ToolResult`].
    async fn execute(&self, input: Value) -> Result<ToolResult>;

    /// Shape check run before parsing
    fn validate_input(&self, input: &Value) -> Result<()> {
        if input.is_object() {
            Ok(())
        } else {
            Err(Error::InvalidInput("input must be a JSON object".to_string()))
        }
    }
}
