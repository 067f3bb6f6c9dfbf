//! pagecap Core - Capture Step Pipeline
//!
//! This crate turns loosely-structured capture instructions into a safe,
//! ordered sequence of page actions and runs them against a page backend:
//! - Steps: raw (open) and canonical (closed) step model
//! - Canonicalize: legacy type/field names to the canonical vocabulary
//! - Validate: auto-corrections, warnings and blocking errors
//! - Order: viewport first, capture last
//! - Executor: step-by-step backend driver with navigation retry
//! - Failure: stable error codes and recovery guidance

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod canonicalize;
pub mod context;
pub mod devices;
pub mod error;
pub mod executor;
pub mod failure;
pub mod order;
pub mod pipeline;
pub mod retry;
pub mod steps;
pub mod storage;
pub mod telemetry;
pub mod validate;

pub use canonicalize::{canonicalize, canonicalize_all, Canonicalized, DeprecationCollector};
pub use context::CaptureContext;
pub use devices::{DeviceCatalog, DevicePreset, ResolvedViewport};
pub use error::{Error, Result};
pub use executor::{
    BackendError, CaptureRequest, DomExtract, ExecutionOptions, ExecutionOutcome, Executor,
    ExtractedBlock, ImageFormat, NavigateOptions, NavigationResponse, PageBackend,
    ScreenshotOptions, ScrollTarget, StepResult,
};
pub use failure::{
    classify_step_error, CaptureFailure, ErrorCode, FailureContext, FailureDetail, Recovery,
    RecoveryAction,
};
pub use order::{order, OrderReport};
pub use pipeline::{prepare, PreparedSteps};
pub use retry::{
    with_retry, Retried, RetryClassify, RetryError, RetryObserver, RetryPolicy,
    TracingRetryObserver,
};
pub use steps::{CanonicalStep, RawStep, StepKind};
pub use storage::{ArtifactMetadata, ArtifactStore, FsArtifactStore};
pub use telemetry::{NoopTelemetry, TelemetrySink, TracingTelemetry};
pub use validate::{
    suggested_steps, validate, validate_and_correct, Correction, ValidationContext,
    ValidationResult,
};
