//! Page capture tool
//!
//! Exposes the capture pipeline as the `capture_page` tool:
//! - Request parsing with per-request retry overrides
//! - Validate-only mode that never touches the backend
//! - Text, image and DOM content blocks on success
//! - Structured failures with recovery guidance

mod analysis;
mod config;
mod request;
mod response;
mod tool;

pub use analysis::{analyze, estimate_time_ms, StepAnalysis, ValidationReport};
pub use config::{CaptureConfig, RetryConfig};
pub use request::CaptureInput;
pub use response::{summary, CaptureResponse, ContentBlock};
pub use tool::{tool_definition, CaptureTool};

/// Name the capture tool is registered under
pub const DEFAULT_TOOL_NAME: &str = "capture_page";
