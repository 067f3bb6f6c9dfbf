//! Telemetry sink
//!
//! Capture lifecycle events (`capture.started`, `capture.step`,
//! `capture.navigation_retry`, `capture.completed`, `capture.failed`) are
//! pushed to a [`TelemetrySink`]. Sinks must not block the pipeline.

use serde_json::Value;
use tracing::info;

/// Event emitted when a capture starts
pub const EVENT_STARTED: &str = "capture.started";
/// Event emitted after each step
pub const EVENT_STEP: &str = "capture.step";
/// Event emitted before a navigation retry
pub const EVENT_NAVIGATION_RETRY: &str = "capture.navigation_retry";
/// Event emitted on success
pub const EVENT_COMPLETED: &str = "capture.completed";
/// Event emitted on fatal failure
pub const EVENT_FAILED: &str = "capture.failed";

/// Receiver for capture events
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink: Send + Sync {
    /// Record one event
    fn emit(&self, event_type: &str, data: Value);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn emit(&self, _event_type: &str, _data: Value) {}
}

/// Sink that writes events to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn emit(&self, event_type: &str, data: Value) {
        info!(event = event_type, data = %data, "capture event");
    }
}
