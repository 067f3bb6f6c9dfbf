use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A caller-supplied step, exactly as received.
///
/// Raw steps are never inspected outside the canonicalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStep(pub Value);

impl RawStep {
    /// Wrap an arbitrary JSON value
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `type` discriminator, if the step is an object carrying a string `type`
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Fields of the step when it is a JSON object
    #[must_use]
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// Unwrap into the inner value
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for RawStep {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
