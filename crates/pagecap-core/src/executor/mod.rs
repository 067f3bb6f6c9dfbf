//! Executor
//!
//! Drives the page backend through an ordered canonical sequence. Only a
//! navigation that still fails after retries, or a request that ends without
//! any image, is fatal; step failures are recorded and execution moves on.

mod backend;
mod extract;


pub use backend::{
    BackendError, ImageFormat, NavigateOptions, NavigationResponse, PageBackend,
    ScreenshotOptions, ScrollTarget,
};
pub use extract::{truncate_utf8, DomExtract, ExtractedBlock};

use crate::context::CaptureContext;
use crate::devices::ResolvedViewport;
use crate::failure::{CaptureFailure, ErrorCode, FailureContext};
use crate::retry::{
    with_retry, Retried, RetryError, RetryObserver, RetryPolicy, TracingRetryObserver,
};
use crate::steps::{CanonicalStep, ScreenshotStep, StepKind, WaitStep};
use crate::storage::ArtifactMetadata;
use crate::telemetry::{
    TelemetrySink, EVENT_COMPLETED, EVENT_FAILED, EVENT_NAVIGATION_RETRY, EVENT_STARTED,
    EVENT_STEP,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

/// Default per-attempt navigation timeout
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
/// Default timeout for selector waits
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;
/// Default byte ceiling for each extracted DOM block
pub const DEFAULT_DOM_BLOCK_LIMIT_BYTES: usize = 50_000;

/// Submits the form enclosing `selector`, or presses Enter on it
const SUBMIT_SCRIPT: &str = "(selector) => { const el = document.querySelector(selector); \
     if (!el) throw new Error('Element not found: ' + selector); \
     const form = el.form || el.closest('form'); \
     if (form) { \
       if (typeof form.requestSubmit === 'function') { form.requestSubmit(); } else { form.submit(); } \
       return true; \
     } \
     el.dispatchEvent(new KeyboardEvent('keydown', { key: 'Enter', code: 'Enter', bubbles: true })); \
     el.dispatchEvent(new KeyboardEvent('keyup', { key: 'Enter', code: 'Enter', bubbles: true })); \
     return false; }";

/// One capture request, after parsing
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Page to capture
    pub url: String,
    /// Extra navigation headers
    pub headers: BTreeMap<String, String>,
    /// DOM blocks to extract after capture
    pub extract: Vec<DomExtract>,
    /// Default for screenshot steps without `fullPage`
    pub full_page: bool,
    /// Navigation retry policy
    pub retry: RetryPolicy,
}

impl CaptureRequest {
    /// Create a request with default settings
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            extract: Vec::new(),
            full_page: false,
            retry: RetryPolicy::default(),
        }
    }

    /// Add a navigation header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Request a DOM block
    #[must_use]
    pub fn with_extract(mut self, kind: DomExtract) -> Self {
        if !self.extract.contains(&kind) {
            self.extract.push(kind);
        }
        self
    }

    /// Capture the full page by default
    #[must_use]
    pub fn with_full_page(mut self, full_page: bool) -> Self {
        self.full_page = full_page;
        self
    }

    /// Set the navigation retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

/// Executor limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Per-attempt navigation timeout
    pub navigation_timeout_ms: u64,
    /// Timeout for selector waits without their own
    pub wait_timeout_ms: u64,
    /// Byte ceiling for each extracted DOM block
    pub dom_block_limit_bytes: usize,
    /// Encoding of captured images
    pub image_format: ImageFormat,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            dom_block_limit_bytes: DEFAULT_DOM_BLOCK_LIMIT_BYTES,
            image_format: ImageFormat::Png,
        }
    }
}

impl ExecutionOptions {
    /// Set the navigation timeout
    #[must_use]
    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the selector wait timeout
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the DOM block ceiling
    #[must_use]
    pub fn with_dom_block_limit(mut self, bytes: usize) -> Self {
        self.dom_block_limit_bytes = bytes;
        self
    }

    /// Set the image encoding
    #[must_use]
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Position in the ordered sequence
    pub index: usize,
    /// Step type
    pub kind: String,
    /// Selector the step acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Whether the step did what it asked for
    pub success: bool,
    /// The step was not attempted
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Extra detail on a successful step (e.g. a capture fallback)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Time spent on the step
    pub duration_ms: u64,
}

/// Outcome of a successful request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    /// Per-step results, in execution order
    pub step_results: Vec<StepResult>,
    /// Encoded image
    #[serde(skip)]
    pub artifact: Vec<u8>,
    /// Image encoding
    pub format: ImageFormat,
    /// Whether the image covers the whole page
    pub full_page: bool,
    /// Navigation retries used
    pub retry_attempts: u32,
    /// Extracted DOM blocks
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extracted: Vec<ExtractedBlock>,
    /// Where the artifact store put the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<String>,
    /// URL after redirects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    /// Status of the main document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Viewport in effect at capture time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ResolvedViewport>,
    /// Time spent on the request
    pub execution_time_ms: u64,
}

impl ExecutionOutcome {
    /// Number of steps that did not succeed
    #[must_use]
    pub fn failed_steps(&self) -> usize {
        self.step_results.iter().filter(|r| !r.success).count()
    }

    /// Device preset in effect, if any
    #[must_use]
    pub fn device(&self) -> Option<&str> {
        self.viewport.as_ref().and_then(|v| v.device.as_deref())
    }
}

struct StepFailure {
    code: Option<ErrorCode>,
    message: String,
    skipped: bool,
}

impl StepFailure {
    fn backend(error: BackendError, kind: Option<StepKind>) -> Self {
        Self {
            code: Some(error.step_code(kind)),
            message: error.to_string(),
            skipped: false,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: Some(ErrorCode::ValidationFailed),
            message: message.into(),
            skipped: false,
        }
    }

    fn skipped(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            skipped: true,
        }
    }
}

struct Capture {
    bytes: Vec<u8>,
    full_page: bool,
}

#[derive(Default)]
struct RunState {
    viewport: Option<ResolvedViewport>,
    capture: Option<Capture>,
}

/// Emits a telemetry event for every navigation retry
struct NavigationObserver<'a> {
    telemetry: &'a dyn TelemetrySink,
    url: &'a str,
}

impl RetryObserver for NavigationObserver<'_> {
    fn on_failure(&self, attempt: u32, error: &str, retryable: bool, next_delay: Option<Duration>) {
        TracingRetryObserver.on_failure(attempt, error, retryable, next_delay);
        if let Some(delay) = next_delay {
            self.telemetry.emit(
                EVENT_NAVIGATION_RETRY,
                json!({
                    "url": self.url,
                    "attempt": attempt,
                    "delayMs": delay.as_millis() as u64,
                    "error": error,
                }),
            );
        }
    }

    fn on_success(&self, attempt: u32) {
        TracingRetryObserver.on_success(attempt);
    }
}

/// Runs ordered steps against the backend in a [`CaptureContext`]
#[derive(Clone)]
pub struct Executor {
    context: CaptureContext,
    options: ExecutionOptions,
}

impl Executor {
    /// Create an executor with default limits
    #[must_use]
    pub fn new(context: CaptureContext) -> Self {
        Self {
            context,
            options: ExecutionOptions::default(),
        }
    }

    /// Set limits
    #[must_use]
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Limits in effect
    #[must_use]
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Collaborators in use
    #[must_use]
    pub fn context(&self) -> &CaptureContext {
        &self.context
    }

    /// Run a prepared sequence.
    ///
    /// A leading viewport step is applied before navigation. Navigation is
    /// retried per `request.retry`; after that, every step runs in order and
    /// failures are recorded in the step results. The image comes from the
    /// last successful screenshot step, or from one extra page capture when
    /// no screenshot step produced one.
    #[instrument(skip(self, request, steps), fields(url = %request.url, steps = steps.len()))]
    pub async fn execute(
        &self,
        request: &CaptureRequest,
        steps: &[CanonicalStep],
    ) -> Result<ExecutionOutcome, CaptureFailure> {
        let started = Instant::now();
        let telemetry = self.context.telemetry.as_ref();
        telemetry.emit(
            EVENT_STARTED,
            json!({ "url": request.url, "steps": steps.len() }),
        );
        info!("Starting capture");

        let mut state = RunState::default();
        let mut results = Vec::with_capacity(steps.len());
        let mut first_after_navigation = 0;

        if let Some(step @ CanonicalStep::Viewport(_)) = steps.first() {
            results.push(self.run_and_record(0, step, request, &mut state).await);
            first_after_navigation = 1;
        }

        let navigation = match self.navigate(request).await {
            Ok(navigation) => navigation,
            Err(err) => {
                let code = err.last_error.navigation_code();
                let mut failure = CaptureFailure::new(
                    code,
                    format!(
                        "Navigation to {} failed after {} attempt(s): {}",
                        request.url, err.attempts, err.last_error
                    ),
                )
                .with_context(progress(request, steps, &results, started));
                if !err.retryable {
                    failure = failure.with_description(format!(
                        "{}. The error did not look transient, so it was not retried",
                        code.hint()
                    ));
                }
                return Err(self.fail(failure));
            }
        };

        for (index, step) in steps.iter().enumerate().skip(first_after_navigation) {
            let result = self.run_and_record(index, step, request, &mut state).await;
            results.push(result);
        }

        let capture = match state.capture.take() {
            Some(capture) => capture,
            None => match self.capture_page(request.full_page).await {
                Ok(bytes) => Capture {
                    bytes,
                    full_page: request.full_page,
                },
                Err(err) => {
                    let failure = CaptureFailure::new(
                        ErrorCode::CaptureFailed,
                        format!("No image could be captured: {err}"),
                    )
                    .with_context(progress(request, steps, &results, started));
                    return Err(self.fail(failure));
                }
            },
        };

        let extracted = self.extract(&request.extract).await;
        let artifact_location = self
            .store(request, &capture, state.viewport.as_ref())
            .await;

        let outcome = ExecutionOutcome {
            step_results: results,
            format: self.options.image_format,
            full_page: capture.full_page,
            artifact: capture.bytes,
            retry_attempts: navigation.retry_attempts,
            extracted,
            artifact_location,
            final_url: navigation.value.final_url,
            http_status: navigation.value.status,
            viewport: state.viewport,
            execution_time_ms: elapsed_ms(started),
        };

        telemetry.emit(
            EVENT_COMPLETED,
            json!({
                "url": request.url,
                "steps": outcome.step_results.len(),
                "failedSteps": outcome.failed_steps(),
                "retryAttempts": outcome.retry_attempts,
                "bytes": outcome.artifact.len(),
                "executionTimeMs": outcome.execution_time_ms,
            }),
        );
        info!(
            failed_steps = outcome.failed_steps(),
            retry_attempts = outcome.retry_attempts,
            bytes = outcome.artifact.len(),
            "Capture completed"
        );

        Ok(outcome)
    }

    fn fail(&self, failure: CaptureFailure) -> CaptureFailure {
        warn!(code = %failure.code(), message = %failure.error.message, "Capture failed");
        self.context.telemetry.emit(
            EVENT_FAILED,
            json!({
                "url": failure.context.url,
                "code": failure.code(),
                "message": failure.error.message,
            }),
        );
        failure
    }

    async fn navigate(
        &self,
        request: &CaptureRequest,
    ) -> Result<Retried<NavigationResponse>, RetryError<BackendError>> {
        let backend = self.context.backend.as_ref();
        let url = request.url.as_str();
        let options = &NavigateOptions {
            timeout_ms: self.options.navigation_timeout_ms,
            headers: request.headers.clone(),
        };
        let limit = Duration::from_millis(options.timeout_ms);
        let observer = NavigationObserver {
            telemetry: self.context.telemetry.as_ref(),
            url,
        };

        with_retry(&request.retry, &observer, || async move {
            let response = match timeout(limit, backend.navigate(url, options)).await {
                Ok(result) => result?,
                Err(_) => return Err(BackendError::Timeout(options.timeout_ms)),
            };
            match response.status {
                Some(status) if status >= 400 => Err(BackendError::Http {
                    status,
                    message: format!("navigation returned HTTP {status}"),
                }),
                _ => Ok(response),
            }
        })
        .await
    }

    async fn run_and_record(
        &self,
        index: usize,
        step: &CanonicalStep,
        request: &CaptureRequest,
        state: &mut RunState,
    ) -> StepResult {
        let started = Instant::now();
        let outcome = self.run_step(step, request, state).await;

        let mut result = StepResult {
            index,
            kind: step.type_name().to_string(),
            target: step.target().map(String::from),
            success: true,
            skipped: false,
            error: None,
            code: None,
            note: None,
            duration_ms: elapsed_ms(started),
        };

        match outcome {
            Ok(note) => {
                debug!(step = index, kind = %result.kind, duration_ms = result.duration_ms, "Step completed");
                result.note = note;
            }
            Err(failure) => {
                warn!(step = index, kind = %result.kind, error = %failure.message, "Step failed, continuing");
                result.success = false;
                result.skipped = failure.skipped;
                result.code = failure.code;
                result.error = Some(failure.message);
            }
        }

        self.context.telemetry.emit(
            EVENT_STEP,
            json!({
                "index": index,
                "kind": result.kind,
                "success": result.success,
                "code": result.code,
                "durationMs": result.duration_ms,
            }),
        );
        result
    }

    async fn run_step(
        &self,
        step: &CanonicalStep,
        request: &CaptureRequest,
        state: &mut RunState,
    ) -> Result<Option<String>, StepFailure> {
        let backend = self.context.backend.as_ref();
        let kind = step.kind();
        let on_error = |error: BackendError| StepFailure::backend(error, kind);

        match step {
            CanonicalStep::Viewport(viewport) => {
                let resolved = self.context.devices.resolve(viewport);
                backend.set_viewport(&resolved).await.map_err(on_error)?;
                state.viewport = Some(resolved);
                Ok(None)
            }
            CanonicalStep::Wait(wait) => self.run_wait(wait).await,
            CanonicalStep::Fill(fill) => {
                let (Some(target), Some(value)) = (fill.target.as_deref(), fill.value.as_deref())
                else {
                    return Err(StepFailure::invalid("fill requires 'target' and 'value'"));
                };
                backend.type_text(target, value).await.map_err(on_error)?;
                if fill.submit == Some(true) {
                    backend
                        .evaluate(SUBMIT_SCRIPT, json!([target]))
                        .await
                        .map_err(on_error)?;
                }
                Ok(None)
            }
            CanonicalStep::Click(click) => {
                let Some(target) = click.target.as_deref() else {
                    return Err(StepFailure::invalid("click requires 'target'"));
                };
                backend.click(target).await.map_err(on_error)?;
                if let Some(selector) = click.wait_for.as_deref() {
                    self.wait_for(selector, self.options.wait_timeout_ms)
                        .await
                        .map_err(on_error)?;
                }
                Ok(None)
            }
            CanonicalStep::Scroll(scroll) => {
                let target = match (&scroll.to, scroll.y) {
                    (Some(selector), _) => ScrollTarget::Element(selector.clone()),
                    (None, Some(y)) => ScrollTarget::Offset(y),
                    (None, None) => ScrollTarget::Offset(0),
                };
                backend.scroll(&target).await.map_err(on_error)?;
                Ok(None)
            }
            CanonicalStep::Screenshot(shot) => {
                let full_page = shot.full_page.unwrap_or(request.full_page);
                let (bytes, note) =
                    self.run_screenshot(shot, full_page)
                        .await
                        .map_err(|error| StepFailure {
                            code: Some(ErrorCode::CaptureFailed),
                            message: error.to_string(),
                            skipped: false,
                        })?;
                state.capture = Some(Capture { bytes, full_page });
                Ok(note)
            }
            CanonicalStep::Passthrough(passthrough) => {
                match backend.run_step(&passthrough.kind, &passthrough.fields).await {
                    Ok(()) => Ok(None),
                    Err(error @ BackendError::Unsupported(_)) => {
                        Err(StepFailure::skipped(error.to_string()))
                    }
                    Err(error) => Err(on_error(error)),
                }
            }
            CanonicalStep::Invalid(invalid) => Err(StepFailure::invalid(format!(
                "step could not be interpreted: {}",
                invalid.reason
            ))),
        }
    }

    async fn run_wait(&self, wait: &WaitStep) -> Result<Option<String>, StepFailure> {
        if let Some(selector) = wait.for_selector.as_deref() {
            let timeout_ms = wait.timeout.unwrap_or(self.options.wait_timeout_ms);
            self.wait_for(selector, timeout_ms)
                .await
                .map_err(|error| StepFailure::backend(error, Some(StepKind::Wait)))?;
            return Ok(None);
        }
        if let Some(duration) = wait.duration {
            sleep(Duration::from_millis(duration)).await;
            return Ok(None);
        }
        Err(StepFailure::invalid(
            "wait requires 'for' (selector) or 'duration' (ms)",
        ))
    }

    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<(), BackendError> {
        let backend = self.context.backend.as_ref();
        // Outer bound in case the backend ignores timeout_ms
        match timeout(
            Duration::from_millis(timeout_ms),
            backend.wait_for_selector(selector, timeout_ms),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(timeout_ms)),
        }
    }

    async fn run_screenshot(
        &self,
        shot: &ScreenshotStep,
        full_page: bool,
    ) -> Result<(Vec<u8>, Option<String>), BackendError> {
        let mut note = None;

        if let Some(element) = shot.element.as_deref() {
            let options = ScreenshotOptions {
                full_page: false,
                element: Some(element.to_string()),
                format: self.options.image_format,
            };
            let reason = match self.context.backend.screenshot(&options).await {
                Ok(bytes) if !bytes.is_empty() => return Ok((bytes, None)),
                Ok(_) => "empty image".to_string(),
                Err(err) => err.to_string(),
            };
            warn!(element = element, reason = %reason, "Element capture failed, capturing the page instead");
            note = Some(format!(
                "element '{element}' could not be captured ({reason}); captured the {} instead",
                if full_page { "full page" } else { "viewport" }
            ));
        }

        let bytes = self.capture_page(full_page).await?;
        Ok((bytes, note))
    }

    async fn capture_page(&self, full_page: bool) -> Result<Vec<u8>, BackendError> {
        let options = ScreenshotOptions {
            full_page,
            element: None,
            format: self.options.image_format,
        };
        let bytes = self.context.backend.screenshot(&options).await?;
        if bytes.is_empty() {
            return Err(BackendError::Other(
                "backend returned an empty image".to_string(),
            ));
        }
        Ok(bytes)
    }

    async fn extract(&self, kinds: &[DomExtract]) -> Vec<ExtractedBlock> {
        let mut blocks = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match self.context.backend.evaluate(kind.script(), json!([])).await {
                Ok(value) => blocks.push(ExtractedBlock::from_value(
                    *kind,
                    value,
                    self.options.dom_block_limit_bytes,
                )),
                Err(err) => warn!(kind = kind.as_str(), error = %err, "DOM extraction failed"),
            }
        }
        blocks
    }

    async fn store(
        &self,
        request: &CaptureRequest,
        capture: &Capture,
        viewport: Option<&ResolvedViewport>,
    ) -> Option<String> {
        let store = self.context.store.as_ref()?;
        let metadata = ArtifactMetadata::new(&request.url, self.options.image_format)
            .with_full_page(capture.full_page)
            .with_device(viewport.and_then(|v| v.device.clone()));

        match store.save(&capture.bytes, &metadata).await {
            Ok(location) => Some(location),
            Err(err) => {
                warn!(error = %err, "Failed to store artifact");
                None
            }
        }
    }
}

fn progress(
    request: &CaptureRequest,
    steps: &[CanonicalStep],
    results: &[StepResult],
    started: Instant,
) -> FailureContext {
    FailureContext {
        url: request.url.clone(),
        steps_total: steps.len(),
        steps_completed: results.len(),
        last_successful_step: results.iter().rev().find(|r| r.success).map(|r| r.index),
        execution_time_ms: elapsed_ms(started),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
