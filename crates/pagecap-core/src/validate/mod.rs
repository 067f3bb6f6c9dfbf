//! Corrector/Validator
//!
//! Inspects a canonical sequence, applies safe auto-fixes and reports what it
//! cannot fix. Only errors block execution; warnings and corrections are
//! informational.

mod selector;

#[cfg(test)]
mod tests;

pub use selector::is_static_selector;

use crate::devices::DeviceCatalog;
use crate::failure::ErrorCode;
use crate::steps::CanonicalStep;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Longest fixed wait accepted before clamping, in milliseconds
pub const DEFAULT_MAX_WAIT_DURATION_MS: u64 = 30_000;

/// Duration used when suggesting a fix for an empty wait
const SUGGESTED_WAIT_MS: u64 = 1_000;

/// An automatically applied fix
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    /// Index of the corrected step in `corrected_steps`
    pub step_index: usize,
    /// Corrected field
    pub field: String,
    /// Original value
    pub from: Value,
    /// New value
    pub to: Value,
    /// Why the fix was applied
    pub reason: String,
}

/// A blocking problem with its error code
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Step the issue belongs to, if any
    pub step: Option<usize>,
    /// Error code reported on failure
    pub code: ErrorCode,
    /// Message, as listed in `errors`
    pub message: String,
}

/// Outcome of validating a step sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when `errors` is empty
    pub valid: bool,
    /// Same as `valid`; warnings never block
    pub can_proceed: bool,
    /// Applied fixes
    pub corrections: Vec<Correction>,
    /// Non-blocking findings
    pub warnings: Vec<String>,
    /// Blocking findings
    pub errors: Vec<String>,
    /// The sequence after corrections, only when something changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_steps: Option<Vec<CanonicalStep>>,
    /// Structured form of `errors`
    #[serde(skip)]
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// The first blocking issue, if any
    #[must_use]
    pub fn first_issue(&self) -> Option<&ValidationIssue> {
        self.issues.first()
    }
}

/// Request data the validator needs
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Requested URL
    pub url: &'a str,
    /// Device presets for alias resolution
    pub devices: &'a DeviceCatalog,
    /// Fixed waits above this are clamped
    pub max_wait_duration_ms: u64,
}

impl<'a> ValidationContext<'a> {
    /// Create a context with the default wait ceiling
    #[must_use]
    pub fn new(url: &'a str, devices: &'a DeviceCatalog) -> Self {
        Self {
            url,
            devices,
            max_wait_duration_ms: DEFAULT_MAX_WAIT_DURATION_MS,
        }
    }

    /// Override the wait ceiling
    #[must_use]
    pub fn with_max_wait_duration(mut self, max_ms: u64) -> Self {
        self.max_wait_duration_ms = max_ms;
        self
    }
}

/// Validate a canonical sequence.
///
/// `corrected_steps` is filled only when at least one correction was applied.
#[must_use]
pub fn validate(steps: &[CanonicalStep], context: &ValidationContext<'_>) -> ValidationResult {
    let (mut result, corrected) = validate_and_correct(steps, context);
    if !result.corrections.is_empty() {
        result.corrected_steps = Some(corrected);
    }
    result
}

/// Validate and return the corrected sequence alongside the result.
///
/// The returned result never carries `corrected_steps`; the caller decides
/// whether to attach them (the pipeline also accounts for reordering).
#[must_use]
pub fn validate_and_correct(
    steps: &[CanonicalStep],
    context: &ValidationContext<'_>,
) -> (ValidationResult, Vec<CanonicalStep>) {
    let mut checker = Checker::new(context);
    checker.check_url();

    let mut corrected = steps.to_vec();
    for (index, step) in corrected.iter_mut().enumerate() {
        checker.check_step(index, step);
    }
    checker.check_sequence(&corrected);

    let Checker {
        corrections,
        warnings,
        issues,
        ..
    } = checker;

    debug!(
        steps = steps.len(),
        corrections = corrections.len(),
        warnings = warnings.len(),
        errors = issues.len(),
        "Validated step sequence"
    );

    let valid = issues.is_empty();
    let result = ValidationResult {
        valid,
        can_proceed: valid,
        corrections,
        warnings,
        errors: issues.iter().map(|issue| issue.message.clone()).collect(),
        corrected_steps: None,
        issues,
    };
    (result, corrected)
}

/// A resubmittable version of `steps` with blocking problems removed.
///
/// Empty waits get a short fixed duration; steps missing a required selector
/// or value are dropped, as are uninterpretable steps.
#[must_use]
pub fn suggested_steps(steps: &[CanonicalStep]) -> Vec<CanonicalStep> {
    steps
        .iter()
        .filter_map(|step| match step {
            CanonicalStep::Wait(wait) if wait.for_selector.is_none() && wait.duration.is_none() => {
                let mut wait = wait.clone();
                wait.duration = Some(SUGGESTED_WAIT_MS);
                Some(CanonicalStep::Wait(wait))
            }
            CanonicalStep::Fill(fill) if fill.target.is_none() || fill.value.is_none() => None,
            CanonicalStep::Click(click) if click.target.is_none() => None,
            CanonicalStep::Invalid(_) => None,
            other => Some(other.clone()),
        })
        .collect()
}

struct Checker<'c> {
    context: &'c ValidationContext<'c>,
    corrections: Vec<Correction>,
    warnings: Vec<String>,
    issues: Vec<ValidationIssue>,
}

impl<'c> Checker<'c> {
    fn new(context: &'c ValidationContext<'c>) -> Self {
        Self {
            context,
            corrections: Vec::new(),
            warnings: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn error(&mut self, step: Option<usize>, code: ErrorCode, message: String) {
        self.issues.push(ValidationIssue {
            step,
            code,
            message,
        });
    }

    fn correct(&mut self, step_index: usize, field: &str, from: Value, to: Value, reason: &str) {
        self.corrections.push(Correction {
            step_index,
            field: field.to_string(),
            from,
            to,
            reason: reason.to_string(),
        });
    }

    fn check_url(&mut self) {
        let url = self.context.url.trim();
        let problem = match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => return,
            Ok(parsed) => format!("scheme '{}' is not supported", parsed.scheme()),
            Err(e) => e.to_string(),
        };
        self.error(
            None,
            ErrorCode::InvalidUrl,
            format!("Invalid URL '{url}': {problem}; use an absolute http(s) URL"),
        );
    }

    fn trim_selector(&mut self, index: usize, field: &str, value: &mut Option<String>) {
        let Some(original) = value.as_deref() else {
            return;
        };
        let trimmed = original.trim();
        if trimmed.len() == original.len() {
            return;
        }
        if trimmed.is_empty() {
            self.correct(
                index,
                field,
                Value::String(original.to_string()),
                Value::Null,
                "blank selector removed",
            );
            *value = None;
        } else {
            let trimmed = trimmed.to_string();
            self.correct(
                index,
                field,
                Value::String(original.to_string()),
                Value::String(trimmed.clone()),
                "removed surrounding whitespace from selector",
            );
            *value = Some(trimmed);
        }
    }

    fn check_step(&mut self, index: usize, step: &mut CanonicalStep) {
        let label = format!("step[{index}] ({})", step.type_name());
        match step {
            CanonicalStep::Viewport(viewport) => {
                let Some(name) = viewport.device.clone() else {
                    return;
                };
                let devices = self.context.devices;
                match devices.lookup(&name) {
                    Some(preset) if preset.name != name => {
                        self.correct(
                            index,
                            "device",
                            Value::String(name.clone()),
                            Value::String(preset.name.clone()),
                            "resolved device alias",
                        );
                        viewport.device = Some(preset.name.clone());
                    }
                    Some(_) => {}
                    None => self.warnings.push(format!(
                        "{label}: unknown device '{name}'; passing it through as a custom preset"
                    )),
                }
            }
            CanonicalStep::Wait(wait) => {
                self.trim_selector(index, "for", &mut wait.for_selector);
                match (&wait.for_selector, wait.duration) {
                    (None, None) => self.error(
                        Some(index),
                        ErrorCode::ValidationFailed,
                        format!(
                            "{label}: wait requires 'for' (selector) or 'duration' (ms); nothing to wait for"
                        ),
                    ),
                    (Some(_), Some(_)) => self.warnings.push(format!(
                        "{label}: both 'for' and 'duration' are set; waiting for the selector and ignoring 'duration'"
                    )),
                    _ => {}
                }
                let max = self.context.max_wait_duration_ms;
                if let Some(duration) = wait.duration.filter(|d| *d > max) {
                    self.correct(
                        index,
                        "duration",
                        Value::from(duration),
                        Value::from(max),
                        "fixed wait clamped to the maximum duration",
                    );
                    wait.duration = Some(max);
                }
            }
            CanonicalStep::Fill(fill) => {
                self.trim_selector(index, "target", &mut fill.target);
                if fill.target.is_none() {
                    self.error(
                        Some(index),
                        ErrorCode::ValidationFailed,
                        format!("{label}: fill requires 'target' (selector of the field)"),
                    );
                }
                if fill.value.is_none() {
                    self.error(
                        Some(index),
                        ErrorCode::ValidationFailed,
                        format!("{label}: fill requires 'value'"),
                    );
                }
            }
            CanonicalStep::Click(click) => {
                self.trim_selector(index, "target", &mut click.target);
                self.trim_selector(index, "waitFor", &mut click.wait_for);
                if click.target.is_none() {
                    self.error(
                        Some(index),
                        ErrorCode::ValidationFailed,
                        format!("{label}: click requires 'target' (selector of the element)"),
                    );
                }
            }
            CanonicalStep::Scroll(scroll) => {
                self.trim_selector(index, "to", &mut scroll.to);
                if scroll.to.is_none() && scroll.y.is_none() {
                    self.warnings.push(format!(
                        "{label}: neither 'to' nor 'y' is set; scrolling to the top of the page"
                    ));
                }
            }
            CanonicalStep::Screenshot(shot) => {
                self.trim_selector(index, "element", &mut shot.element);
            }
            CanonicalStep::Passthrough(_) => self.warnings.push(format!(
                "{label}: unknown step type passed through without validation"
            )),
            CanonicalStep::Invalid(invalid) => {
                let reason = invalid.reason.clone();
                self.error(
                    Some(index),
                    ErrorCode::ValidationFailed,
                    format!("step[{index}]: could not interpret step: {reason}"),
                );
            }
        }
    }

    fn check_sequence(&mut self, steps: &[CanonicalStep]) {
        let mut waited: HashSet<&str> = HashSet::new();
        let mut screenshot_at: Option<usize> = None;
        let mut viewports = 0usize;

        for (index, step) in steps.iter().enumerate() {
            let label = format!("step[{index}] ({})", step.type_name());

            // The first viewport is hoisted ahead of navigation by the orderer
            let hoisted = viewports == 0 && step.is_viewport();
            if let Some(shot) = screenshot_at {
                if !step.is_wait() && !hoisted {
                    self.warnings.push(format!(
                        "{label}: runs after the screenshot at step[{shot}]; it will execute but its effect is not captured"
                    ));
                }
            }

            match step {
                CanonicalStep::Viewport(_) => viewports += 1,
                CanonicalStep::Wait(wait) => {
                    if let Some(selector) = wait.for_selector.as_deref() {
                        waited.insert(selector);
                    }
                }
                CanonicalStep::Click(_) | CanonicalStep::Fill(_) => {
                    if let Some(target) = step.target() {
                        if !is_static_selector(target) && !waited.contains(target) {
                            self.warnings.push(format!(
                                "{label}: '{target}' may not exist until the page finishes rendering; consider adding {{\"type\": \"wait\", \"for\": \"{target}\"}} before this step"
                            ));
                        }
                    }
                    if let CanonicalStep::Click(click) = step {
                        if let Some(selector) = click.wait_for.as_deref() {
                            waited.insert(selector);
                        }
                    }
                }
                CanonicalStep::Screenshot(_) => {
                    screenshot_at.get_or_insert(index);
                }
                _ => {}
            }
        }

        if viewports > 1 {
            self.warnings.push(format!(
                "{viewports} viewport steps found; only the first is applied before navigation, later ones run in place"
            ));
        }
    }
}
