//! Canonical steps
//!
//! One tag per action, one field name per concept.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Step kinds known to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Configure the emulated viewport
    Viewport,
    /// Wait for a selector or a fixed duration
    Wait,
    /// Set a form field value
    Fill,
    /// Click an element
    Click,
    /// Scroll the page
    Scroll,
    /// Capture an image
    Screenshot,
}

impl StepKind {
    /// All documented kinds, in documentation order
    pub const ALL: [StepKind; 6] = [
        Self::Viewport,
        Self::Wait,
        Self::Fill,
        Self::Click,
        Self::Scroll,
        Self::Screenshot,
    ];

    /// Returns the wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewport => "viewport",
            Self::Wait => "wait",
            Self::Fill => "fill",
            Self::Click => "click",
            Self::Scroll => "scroll",
            Self::Screenshot => "screenshot",
        }
    }

    /// Parse a canonical wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Viewport configuration, applied before navigation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportStep {
    /// Device preset name (resolved through the device catalog)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Viewport width in CSS pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Viewport height in CSS pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Device pixel ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_scale_factor: Option<f64>,
    /// Emulate a mobile device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mobile: Option<bool>,
    /// Emulate touch support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_touch: Option<bool>,
    /// Swap width and height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_landscape: Option<bool>,
    /// User agent override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Fields with no canonical counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wait for a selector or a fixed duration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaitStep {
    /// Selector to wait for
    #[serde(rename = "for", skip_serializing_if = "Option::is_none")]
    pub for_selector: Option<String>,
    /// Fixed wait in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Selector wait timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Fields with no canonical counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Set a form field value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FillStep {
    /// Selector of the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Value to set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Submit the enclosing form afterwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<bool>,
    /// Fields with no canonical counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Click an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClickStep {
    /// Selector of the element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Selector to wait for after clicking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<String>,
    /// Fields with no canonical counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scroll to an element or a vertical offset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollStep {
    /// Selector to scroll into view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Vertical offset in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    /// Fields with no canonical counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Capture an image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScreenshotStep {
    /// Capture the whole scrollable page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_page: Option<bool>,
    /// Capture a single element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    /// Fields with no canonical counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A step whose `type` is outside the documented vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct PassthroughStep {
    /// The original `type` value
    pub kind: String,
    /// All other fields, untouched
    pub fields: Map<String, Value>,
}

/// A step that could not be interpreted
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidStep {
    /// The original input
    pub raw: Value,
    /// Why interpretation failed
    pub reason: String,
}

/// A step in the canonical vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalStep {
    /// Viewport configuration
    Viewport(ViewportStep),
    /// Wait
    Wait(WaitStep),
    /// Fill a field
    Fill(FillStep),
    /// Click
    Click(ClickStep),
    /// Scroll
    Scroll(ScrollStep),
    /// Screenshot
    Screenshot(ScreenshotStep),
    /// Unknown step type, kept for forward compatibility
    Passthrough(PassthroughStep),
    /// Uninterpretable input, kept for the validator to flag
    Invalid(InvalidStep),
}

impl CanonicalStep {
    /// Click on `target`
    #[must_use]
    pub fn click(target: impl Into<String>) -> Self {
        Self::Click(ClickStep {
            target: Some(target.into()),
            ..Default::default()
        })
    }

    /// Fill `target` with `value`
    #[must_use]
    pub fn fill(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Fill(FillStep {
            target: Some(target.into()),
            value: Some(value.into()),
            ..Default::default()
        })
    }

    /// Wait for `selector`
    #[must_use]
    pub fn wait_for(selector: impl Into<String>) -> Self {
        Self::Wait(WaitStep {
            for_selector: Some(selector.into()),
            ..Default::default()
        })
    }

    /// Wait a fixed number of milliseconds
    #[must_use]
    pub fn wait_ms(duration: u64) -> Self {
        Self::Wait(WaitStep {
            duration: Some(duration),
            ..Default::default()
        })
    }

    /// Emulate a named device
    #[must_use]
    pub fn viewport_device(device: impl Into<String>) -> Self {
        Self::Viewport(ViewportStep {
            device: Some(device.into()),
            ..Default::default()
        })
    }

    /// Default capture step
    #[must_use]
    pub fn screenshot() -> Self {
        Self::Screenshot(ScreenshotStep::default())
    }

    /// The documented kind, if this is a documented step
    #[must_use]
    pub fn kind(&self) -> Option<StepKind> {
        match self {
            Self::Viewport(_) => Some(StepKind::Viewport),
            Self::Wait(_) => Some(StepKind::Wait),
            Self::Fill(_) => Some(StepKind::Fill),
            Self::Click(_) => Some(StepKind::Click),
            Self::Scroll(_) => Some(StepKind::Scroll),
            Self::Screenshot(_) => Some(StepKind::Screenshot),
            Self::Passthrough(_) | Self::Invalid(_) => None,
        }
    }

    /// Type name as it appears on the wire
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Passthrough(step) => &step.kind,
            Self::Invalid(step) => step
                .raw
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
            other => other.kind().map_or("unknown", |kind| kind.as_str()),
        }
    }

    /// The selector this step acts on, if any
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Wait(step) => step.for_selector.as_deref(),
            Self::Fill(step) => step.target.as_deref(),
            Self::Click(step) => step.target.as_deref(),
            Self::Scroll(step) => step.to.as_deref(),
            Self::Screenshot(step) => step.element.as_deref(),
            Self::Viewport(_) | Self::Passthrough(_) | Self::Invalid(_) => None,
        }
    }

    /// Whether this is a viewport step
    #[must_use]
    pub fn is_viewport(&self) -> bool {
        matches!(self, Self::Viewport(_))
    }

    /// Whether this is a screenshot step
    #[must_use]
    pub fn is_screenshot(&self) -> bool {
        matches!(self, Self::Screenshot(_))
    }

    /// Whether this is a wait step
    #[must_use]
    pub fn is_wait(&self) -> bool {
        matches!(self, Self::Wait(_))
    }

    /// JSON form in the canonical vocabulary
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Viewport(step) => tagged("viewport", step),
            Self::Wait(step) => tagged("wait", step),
            Self::Fill(step) => tagged("fill", step),
            Self::Click(step) => tagged("click", step),
            Self::Scroll(step) => tagged("scroll", step),
            Self::Screenshot(step) => tagged("screenshot", step),
            Self::Passthrough(step) => {
                let mut fields = step.fields.clone();
                fields.insert("type".to_string(), Value::String(step.kind.clone()));
                Value::Object(fields)
            }
            Self::Invalid(step) => step.raw.clone(),
        }
    }
}

fn tagged<T: Serialize>(kind: &str, step: &T) -> Value {
    let mut fields = match serde_json::to_value(step) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    fields.insert("type".to_string(), Value::String(kind.to_string()));
    Value::Object(fields)
}

impl Serialize for CanonicalStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
