//! Error taxonomy and recovery guidance
//!
//! Stable error codes shared by per-step results and fatal failures, plus the
//! structured failure response an automated caller can act on without
//! external documentation.

use crate::steps::{CanonicalStep, StepKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Selector matched nothing
    ElementNotFound,
    /// Element exists but is not visible
    ElementNotVisible,
    /// Element cannot receive the click
    ElementNotClickable,
    /// Navigation did not finish in time
    NavigationTimeout,
    /// Navigation failed
    NavigationFailed,
    /// Selector could not be parsed
    InvalidSelector,
    /// Request URL is not a valid http(s) URL
    InvalidUrl,
    /// A step wait exceeded its timeout
    StepTimeout,
    /// Setting a field value failed
    FillFailed,
    /// Scrolling failed
    ScrollFailed,
    /// A step is missing required fields or could not be interpreted
    ValidationFailed,
    /// No image could be captured
    CaptureFailed,
}

impl ErrorCode {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElementNotFound => "ELEMENT_NOT_FOUND",
            Self::ElementNotVisible => "ELEMENT_NOT_VISIBLE",
            Self::ElementNotClickable => "ELEMENT_NOT_CLICKABLE",
            Self::NavigationTimeout => "NAVIGATION_TIMEOUT",
            Self::NavigationFailed => "NAVIGATION_FAILED",
            Self::InvalidSelector => "INVALID_SELECTOR",
            Self::InvalidUrl => "INVALID_URL",
            Self::StepTimeout => "STEP_TIMEOUT",
            Self::FillFailed => "FILL_FAILED",
            Self::ScrollFailed => "SCROLL_FAILED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::CaptureFailed => "CAPTURE_FAILED",
        }
    }

    /// Short fix suggestion for this failure
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::ElementNotFound => {
                "Check the selector against the live page, or add a wait step for it first"
            }
            Self::ElementNotVisible => {
                "Scroll the element into view or wait for the element to be shown"
            }
            Self::ElementNotClickable => {
                "Another element covers it; dismiss overlays or wait for animations to finish"
            }
            Self::NavigationTimeout => "The page loaded too slowly; retry later",
            Self::NavigationFailed => "Check that the URL is reachable; retry later",
            Self::InvalidSelector => "Fix the CSS selector syntax",
            Self::InvalidUrl => "Use an absolute http:// or https:// URL",
            Self::StepTimeout => "Increase the wait timeout or check the selector",
            Self::FillFailed => "Make sure the target is an input, textarea or editable element",
            Self::ScrollFailed => "Check the scroll target selector",
            Self::ValidationFailed => "Add the missing fields shown in the error",
            Self::CaptureFailed => "Retry the capture, or drop the element selector",
        }
    }

    /// Default recovery action for a fatal failure with this code
    #[must_use]
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::NavigationTimeout | Self::NavigationFailed | Self::CaptureFailed => {
                RecoveryAction::Retry
            }
            Self::InvalidUrl | Self::ValidationFailed | Self::InvalidSelector => {
                RecoveryAction::Modify
            }
            Self::ElementNotFound
            | Self::ElementNotVisible
            | Self::ElementNotClickable
            | Self::StepTimeout
            | Self::FillFailed
            | Self::ScrollFailed => RecoveryAction::Skip,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keyword groups, checked in order; the first group with a hit wins
const MESSAGE_PATTERNS: &[(ErrorCode, &[&str])] = &[
    (
        ErrorCode::InvalidSelector,
        &[
            "invalid selector",
            "not a valid selector",
            "syntaxerror",
            "unexpected token",
        ],
    ),
    (
        ErrorCode::ElementNotVisible,
        &["not visible", "is hidden", "zero size", "outside of the viewport"],
    ),
    (
        ErrorCode::ElementNotClickable,
        &[
            "not clickable",
            "intercept",
            "obscured",
            "receives the click",
            "is disabled",
        ],
    ),
    (
        ErrorCode::ElementNotFound,
        &[
            "not found",
            "no element",
            "no node",
            "failed to find",
            "unable to find",
            "does not exist",
        ],
    ),
    (
        ErrorCode::StepTimeout,
        &["timeout", "timed out", "deadline exceeded"],
    ),
];

/// Classify a free-form step failure message.
///
/// Falls back to the kind's generic code when no keyword matches.
#[must_use]
pub fn classify_step_error(kind: Option<StepKind>, message: &str) -> ErrorCode {
    let lower = message.to_lowercase();
    MESSAGE_PATTERNS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(*kw)))
        .map(|(code, _)| *code)
        .unwrap_or(match kind {
            Some(StepKind::Fill) => ErrorCode::FillFailed,
            Some(StepKind::Scroll) => ErrorCode::ScrollFailed,
            Some(StepKind::Click) => ErrorCode::ElementNotClickable,
            Some(StepKind::Wait) => ErrorCode::StepTimeout,
            Some(StepKind::Screenshot) => ErrorCode::CaptureFailed,
            Some(StepKind::Viewport) | None => ErrorCode::ValidationFailed,
        })
}

/// What the caller should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryAction {
    /// Resubmit the same request later
    Retry,
    /// Change the request (see `correctedSteps`)
    Modify,
    /// Drop the failing step
    Skip,
    /// Give up
    Abort,
}

/// Recovery guidance attached to a failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recovery {
    /// Suggested action
    pub action: RecoveryAction,
    /// What to do, in words
    pub description: String,
    /// A corrected step list the caller can resubmit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_steps: Option<Vec<CanonicalStep>>,
}

/// Error details of a failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    /// Stable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Index of the failing step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    /// Type of the failing step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    /// Selector of the failing step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Request progress at the time of failure
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureContext {
    /// Requested URL
    pub url: String,
    /// Number of steps in the ordered sequence
    pub steps_total: usize,
    /// Steps that ran (successfully or not) before the failure
    pub steps_completed: usize,
    /// Index of the last step that succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_step: Option<usize>,
    /// Time spent on the request
    pub execution_time_ms: u64,
}

/// A fatal request failure
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{}: {}", .error.code, .error.message)]
#[serde(rename_all = "camelCase")]
pub struct CaptureFailure {
    /// Always false
    pub success: bool,
    /// What failed
    pub error: FailureDetail,
    /// How to recover
    pub recovery: Recovery,
    /// How far the request got
    pub context: FailureContext,
}

impl CaptureFailure {
    /// Create a failure with the code's default recovery action and hint
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: FailureDetail {
                code,
                message: message.into(),
                step: None,
                step_type: None,
                target: None,
            },
            recovery: Recovery {
                action: code.recovery_action(),
                description: code.hint().to_string(),
                corrected_steps: None,
            },
            context: FailureContext::default(),
        }
    }

    /// Code of this failure
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.error.code
    }

    /// Attach the failing step
    #[must_use]
    pub fn with_step(mut self, index: usize, step: &CanonicalStep) -> Self {
        self.error.step = Some(index);
        self.error.step_type = Some(step.type_name().to_string());
        self.error.target = step.target().map(String::from);
        self
    }

    /// Replace the recovery description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.recovery.description = description.into();
        self
    }

    /// Attach a corrected step list
    #[must_use]
    pub fn with_corrected_steps(mut self, steps: Vec<CanonicalStep>) -> Self {
        self.recovery.corrected_steps = Some(steps);
        self
    }

    /// Attach progress context
    #[must_use]
    pub fn with_context(mut self, context: FailureContext) -> Self {
        self.context = context;
        self
    }
}
