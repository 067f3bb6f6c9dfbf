//! Step preparation
//!
//! Runs the Canonicalizer, the Corrector/Validator and the Orderer over a
//! raw request, without touching the backend.

use crate::canonicalize::{canonicalize_all, DeprecationCollector};
use crate::failure::{CaptureFailure, ErrorCode, FailureContext};
use crate::order::order;
use crate::steps::{CanonicalStep, RawStep};
use crate::validate::{suggested_steps, validate_and_correct, Correction, ValidationContext, ValidationResult};
use serde_json::json;
use tracing::debug;

/// A request's steps after canonicalization, correction and ordering
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSteps {
    /// The ordered sequence the executor will run
    pub steps: Vec<CanonicalStep>,
    /// Validation findings (`corrected_steps` holds the ordered sequence when
    /// anything was corrected or moved)
    pub validation: ValidationResult,
    /// Deprecation messages for legacy names seen in this request
    pub deprecations: Vec<String>,
    /// Original index of a viewport step moved to the front
    pub moved_viewport_from: Option<usize>,
    /// Whether a default screenshot step was appended
    pub appended_screenshot: bool,
    validated: Vec<CanonicalStep>,
}

impl PreparedSteps {
    /// Whether the executor may run
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        self.validation.can_proceed
    }

    /// The fatal failure for a request that did not validate.
    ///
    /// Carries the first blocking issue's code and step, every error message,
    /// and a resubmittable step list with the blocking steps fixed or dropped.
    #[must_use]
    pub fn failure(&self, url: &str) -> Option<CaptureFailure> {
        if self.validation.valid {
            return None;
        }
        let issue = self.validation.first_issue();
        let code = issue.map_or(ErrorCode::ValidationFailed, |issue| issue.code);

        let mut failure = CaptureFailure::new(code, self.validation.errors.join("; "))
            .with_context(FailureContext {
                url: url.to_string(),
                steps_total: self.steps.len(),
                ..FailureContext::default()
            });

        if let Some(index) = issue.and_then(|issue| issue.step) {
            if let Some(step) = self.validated.get(index) {
                failure = failure.with_step(index, step);
            }
        }
        if code != ErrorCode::InvalidUrl {
            failure = failure.with_corrected_steps(order(suggested_steps(&self.validated)).steps);
        }
        Some(failure)
    }
}

/// Prepare raw steps for execution.
///
/// Deprecations are collected per call. Correction indices point into the
/// ordered sequence, and reordering a viewport step is reported as a
/// `position` correction whose `from` is its index before ordering.
#[must_use]
pub fn prepare(raw: &[RawStep], context: &ValidationContext<'_>) -> PreparedSteps {
    let mut deprecations = DeprecationCollector::new();
    let canonical = canonicalize_all(raw, &mut deprecations);
    let (mut validation, validated) = validate_and_correct(&canonical, context);
    let report = order(validated.clone());

    for correction in &mut validation.corrections {
        correction.step_index = report.ordered_index(correction.step_index);
    }
    if let Some(from) = report.moved_viewport_from {
        validation.corrections.push(Correction {
            step_index: 0,
            field: "position".to_string(),
            from: json!(from),
            to: json!(0),
            reason: "viewport must be configured before navigation".to_string(),
        });
    }
    if !validation.corrections.is_empty() || report.changed() {
        validation.corrected_steps = Some(report.steps.clone());
    }

    debug!(
        raw = raw.len(),
        ordered = report.steps.len(),
        deprecations = deprecations.notices().len(),
        valid = validation.valid,
        "Prepared steps"
    );

    PreparedSteps {
        steps: report.steps,
        validation,
        deprecations: deprecations.messages(),
        moved_viewport_from: report.moved_viewport_from,
        appended_screenshot: report.appended_screenshot,
        validated,
    }
}
