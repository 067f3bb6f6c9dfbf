//! Capture tool implementation

use crate::error::Result;
use crate::surface::{Tool, ToolDefinition, ToolResult};
use pagecap_core::retry::{MAX_DELAY_LIMIT_MS, MAX_RETRIES_LIMIT};
use pagecap_core::telemetry::EVENT_FAILED;
use pagecap_core::{
    prepare, CaptureContext, CaptureFailure, Executor, FsArtifactStore, ValidationContext,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::analysis::ValidationReport;
use super::config::CaptureConfig;
use super::request::CaptureInput;
use super::response::CaptureResponse;
use super::DEFAULT_TOOL_NAME;

/// Page capture tool
///
/// Accepts loosely-structured steps, repairs and orders them, then drives the
/// context's page backend and returns an image with a per-step report.
pub struct CaptureTool {
    definition: ToolDefinition,
    config: CaptureConfig,
    executor: Executor,
}

impl CaptureTool {
    /// Create a capture tool with default configuration
    #[must_use]
    pub fn new(context: CaptureContext) -> Self {
        Self::with_config(context, CaptureConfig::default())
    }

    /// Create a capture tool with custom configuration.
    ///
    /// When `artifact_dir` is set and the context carries no store, captures
    /// are saved there.
    #[must_use]
    pub fn with_config(context: CaptureContext, config: CaptureConfig) -> Self {
        let context = match &config.artifact_dir {
            Some(dir) if context.store.is_none() => {
                context.with_store(Arc::new(FsArtifactStore::new(dir.clone())))
            }
            _ => context,
        };
        let executor = Executor::new(context).with_options(config.execution_options());

        Self {
            definition: tool_definition().with_enabled(config.enabled),
            config,
            executor,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    fn failure_result(&self, failure: &CaptureFailure, duration_ms: u64) -> Result<ToolResult> {
        Ok(ToolResult::failure_with_output(
            failure.to_string(),
            serde_json::to_value(failure)?,
            duration_ms,
        ))
    }
}

/// Definition of the `capture_page` tool
#[must_use]
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition::new(
        DEFAULT_TOOL_NAME,
        "Capture a screenshot of a web page after optional interaction steps. \
         Steps run in order: viewport (device emulation, always applied first), \
         wait (for a selector or a duration), fill, click, scroll, screenshot (always last). \
         Set validate=true to check and normalize steps without opening the page.",
        build_parameters_schema(),
    )
}

fn build_parameters_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "description": "Page to capture (http or https)"
            },
            "steps": {
                "type": "array",
                "description": "Actions to perform before capture",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["viewport", "wait", "fill", "click", "scroll", "screenshot"]
                        },
                        "device": { "type": "string", "description": "Device preset (viewport)" },
                        "width": { "type": "integer" },
                        "height": { "type": "integer" },
                        "isLandscape": { "type": "boolean" },
                        "for": { "type": "string", "description": "Selector to wait for (wait)" },
                        "duration": { "type": "integer", "description": "Milliseconds to wait (wait)" },
                        "timeout": { "type": "integer", "description": "Selector wait timeout in ms" },
                        "target": { "type": "string", "description": "Selector (fill, click)" },
                        "value": { "type": "string", "description": "Text to enter (fill)" },
                        "submit": { "type": "boolean", "description": "Submit the form after filling" },
                        "waitFor": { "type": "string", "description": "Selector to wait for after a click" },
                        "to": { "type": "string", "description": "Selector to scroll to (scroll)" },
                        "y": { "type": "integer", "description": "Vertical offset in px (scroll)" },
                        "fullPage": { "type": "boolean" },
                        "element": { "type": "string", "description": "Selector to capture (screenshot)" }
                    },
                    "required": ["type"]
                }
            },
            "headers": {
                "type": "object",
                "description": "Extra HTTP headers for navigation",
                "additionalProperties": { "type": "string" }
            },
            "validate": {
                "type": "boolean",
                "description": "Only validate and normalize the steps"
            },
            "extract": {
                "type": "array",
                "description": "DOM content to return with the image",
                "items": { "type": "string", "enum": ["html", "text", "tree"] }
            },
            "fullPage": {
                "type": "boolean",
                "description": "Capture the full page when a screenshot step does not say"
            },
            "retry": {
                "type": "object",
                "description": "Navigation retry overrides",
                "properties": {
                    "maxRetries": { "type": "integer", "minimum": 0, "maximum": MAX_RETRIES_LIMIT },
                    "initialDelayMs": { "type": "integer", "minimum": 0, "maximum": MAX_DELAY_LIMIT_MS },
                    "maxDelayMs": { "type": "integer", "minimum": 0, "maximum": MAX_DELAY_LIMIT_MS },
                    "backoffMultiplier": { "type": "number", "minimum": 1 },
                    "retryableStatusCodes": { "type": "array", "items": { "type": "integer" } },
                    "retryableErrorPatterns": { "type": "array", "items": { "type": "string" } }
                }
            }
        },
        "required": ["url"]
    })
}

#[async_trait::async_trait]
impl Tool for CaptureTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        if !self.config.enabled {
            return Ok(ToolResult::failure(
                "Capture tool is disabled in configuration",
                start.elapsed().as_millis() as u64,
            ));
        }

        self.validate_input(&input)?;
        let input = CaptureInput::parse(&input, &self.config.retry_policy())?;
        debug!(
            url = %input.url,
            steps = input.steps.len(),
            validate_only = input.validate_only,
            "Executing capture"
        );

        let context = self.executor.context();
        let validation = ValidationContext::new(&input.url, &context.devices)
            .with_max_wait_duration(self.config.max_wait_duration_ms);
        let prepared = prepare(&input.steps, &validation);

        if input.validate_only {
            let report = ValidationReport::from_prepared(&input.url, &prepared, &context.devices);
            return Ok(ToolResult::success(
                serde_json::to_value(&report)?,
                start.elapsed().as_millis() as u64,
            ));
        }

        if let Some(failure) = prepared.failure(&input.url) {
            warn!(code = %failure.code(), "Capture request rejected before execution");
            context.telemetry.emit(
                EVENT_FAILED,
                json!({
                    "url": input.url,
                    "code": failure.code(),
                    "message": failure.error.message,
                }),
            );
            return self.failure_result(&failure, start.elapsed().as_millis() as u64);
        }

        let request = input.to_request();
        match self.executor.execute(&request, &prepared.steps).await {
            Ok(outcome) => {
                info!(
                    url = %input.url,
                    failed_steps = outcome.failed_steps(),
                    bytes = outcome.artifact.len(),
                    "Capture succeeded"
                );
                let response = CaptureResponse::new(
                    &input.url,
                    outcome,
                    prepared.deprecations,
                    prepared.validation.warnings,
                );
                Ok(ToolResult::success(
                    serde_json::to_value(&response)?,
                    start.elapsed().as_millis() as u64,
                ))
            }
            Err(failure) => self.failure_result(&failure, start.elapsed().as_millis() as u64),
        }
    }
}
