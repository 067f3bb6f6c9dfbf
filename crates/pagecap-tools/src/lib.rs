//! pagecap Tools - Tool Surface
//!
//! This crate exposes the capture pipeline to automated callers:
//! - Surface: tool definition, result and execution trait
//! - Capture: the `capture_page` tool, its configuration and responses

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capture;
pub mod error;
pub mod surface;

pub use capture::{
    analyze, CaptureConfig, CaptureInput, CaptureResponse, CaptureTool, ContentBlock,
    RetryConfig, ValidationReport,
};
pub use error::{Error, Result};
pub use surface::{Tool, ToolDefinition, ToolResult};
