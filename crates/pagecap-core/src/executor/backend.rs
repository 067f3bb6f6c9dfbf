//! Page backend interface
//!
//! The browser itself lives behind [`PageBackend`]; the executor only talks
//! to this trait.

use crate::devices::ResolvedViewport;
use crate::failure::{classify_step_error, ErrorCode};
use crate::retry::RetryClassify;
use crate::steps::StepKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Image encoding for captures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG (lossless)
    #[default]
    Png,
    /// JPEG
    Jpeg,
}

impl ImageFormat {
    /// MIME type of the encoded image
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extension
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Options for a navigation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
    /// Per-attempt timeout
    pub timeout_ms: u64,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

/// What the backend reports after a navigation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationResponse {
    /// HTTP status of the main document
    pub status: Option<u16>,
    /// URL after redirects
    pub final_url: Option<String>,
}

/// Where to scroll
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollTarget {
    /// Bring an element into view
    Element(String),
    /// Absolute vertical position in pixels
    Offset(i64),
}

/// Options for an image capture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenshotOptions {
    /// Capture the whole scrollable page
    pub full_page: bool,
    /// Capture only this element
    pub element: Option<String>,
    /// Encoding
    pub format: ImageFormat,
}

/// Backend failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Selector matched nothing
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Element exists but is hidden
    #[error("element not visible: {0}")]
    ElementNotVisible(String),

    /// Element cannot receive the click
    #[error("element not clickable: {0}")]
    NotClickable(String),

    /// Selector syntax rejected by the page
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Operation timed out
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// Document loaded with an error status
    #[error("HTTP {status}: {message}")]
    Http {
        /// Status code
        status: u16,
        /// Status text or detail
        message: String,
    },

    /// Step type the backend has no handler for
    #[error("unsupported step type '{0}'")]
    Unsupported(String),

    /// Anything else, as reported by the backend
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Error code for a failure while running a step of `kind`
    #[must_use]
    pub fn step_code(&self, kind: Option<StepKind>) -> ErrorCode {
        match self {
            Self::ElementNotFound(_) => ErrorCode::ElementNotFound,
            Self::ElementNotVisible(_) => ErrorCode::ElementNotVisible,
            Self::NotClickable(_) => ErrorCode::ElementNotClickable,
            Self::InvalidSelector(_) => ErrorCode::InvalidSelector,
            Self::Timeout(_) => ErrorCode::StepTimeout,
            Self::Unsupported(_) => ErrorCode::ValidationFailed,
            Self::Http { message, .. } | Self::Other(message) => classify_step_error(kind, message),
        }
    }

    /// Error code for a failed navigation
    #[must_use]
    pub fn navigation_code(&self) -> ErrorCode {
        match self {
            Self::Timeout(_) => ErrorCode::NavigationTimeout,
            Self::Other(message) if message.to_lowercase().contains("timeout") => {
                ErrorCode::NavigationTimeout
            }
            _ => ErrorCode::NavigationFailed,
        }
    }
}

impl RetryClassify for BackendError {
    fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Page automation backend
#[async_trait::async_trait]
pub trait PageBackend: Send + Sync {
    /// Apply viewport emulation
    async fn set_viewport(&self, viewport: &ResolvedViewport) -> Result<(), BackendError>;

    /// Load a URL
    async fn navigate(
        &self,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<NavigationResponse, BackendError>;

    /// Wait until a selector is present
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64)
        -> Result<(), BackendError>;

    /// Click an element
    async fn click(&self, selector: &str) -> Result<(), BackendError>;

    /// Replace the value of a form field
    async fn type_text(&self, selector: &str, text: &str) -> Result<(), BackendError>;

    /// Scroll the page
    async fn scroll(&self, target: &ScrollTarget) -> Result<(), BackendError>;

    /// Capture an image
    async fn screenshot(&self, options: &ScreenshotOptions) -> Result<Vec<u8>, BackendError>;

    /// Run a JavaScript function in the page; `args` is a JSON array of arguments
    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, BackendError>;

    /// Run a step whose type is outside the built-in vocabulary.
    ///
    /// `fields` holds every field of the step except `type`. The default
    /// handles nothing.
    async fn run_step(&self, kind: &str, _fields: &Map<String, Value>) -> Result<(), BackendError> {
        Err(BackendError::Unsupported(kind.to_string()))
    }
}
