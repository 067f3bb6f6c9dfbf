//! Canonicalizer
//!
//! Maps every accepted step shape (current and legacy type names, current and
//! legacy field names) onto [`CanonicalStep`]. Pure lookup and rename: the
//! only cardinality change is the legacy `form` step, which expands into
//! `fill` steps plus an optional submitting `click`.
//!
//! Never fails. Unknown types pass through, uninterpretable input becomes
//! [`CanonicalStep::Invalid`] for the validator to report.

mod aliases;
mod deprecation;


pub use deprecation::{DeprecationCollector, DeprecationNotice, NoticeScope};

use crate::steps::{
    CanonicalStep, ClickStep, FillStep, InvalidStep, PassthroughStep, RawStep, ScreenshotStep,
    ScrollStep, StepKind, ViewportStep, WaitStep,
};
use aliases::{field_aliases, is_delay_type, is_form_type, resolve_type};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Output of canonicalizing one raw step
#[derive(Debug, Clone, PartialEq)]
pub enum Canonicalized {
    /// One raw step became one canonical step
    One(CanonicalStep),
    /// A composite step expanded into several
    Many(Vec<CanonicalStep>),
}

impl Canonicalized {
    /// Flatten into a list
    #[must_use]
    pub fn into_vec(self) -> Vec<CanonicalStep> {
        match self {
            Self::One(step) => vec![step],
            Self::Many(steps) => steps,
        }
    }
}

/// Canonicalize a single raw step, discarding deprecation notices
#[must_use]
pub fn canonicalize(raw: &RawStep) -> Canonicalized {
    canonicalize_with(raw, &mut DeprecationCollector::new())
}

/// Canonicalize a single raw step, reporting legacy names to `deprecations`
pub fn canonicalize_with(raw: &RawStep, deprecations: &mut DeprecationCollector) -> Canonicalized {
    let Some(object) = raw.as_object() else {
        return Canonicalized::One(invalid(raw.0.clone(), "step must be a JSON object"));
    };

    let type_name = match object.get("type") {
        Some(Value::String(name)) => name.as_str(),
        Some(_) => {
            return Canonicalized::One(invalid(raw.0.clone(), "'type' must be a string"));
        }
        None => {
            return Canonicalized::One(invalid(raw.0.clone(), "missing 'type' discriminator"));
        }
    };

    if is_form_type(type_name) {
        deprecations.record_type(type_name, "fill");
        return expand_form(raw, object, deprecations);
    }

    Canonicalized::One(canonicalize_object(raw, object, type_name, deprecations))
}

/// Canonicalize a whole sequence, flattening composite steps
pub fn canonicalize_all(
    raws: &[RawStep],
    deprecations: &mut DeprecationCollector,
) -> Vec<CanonicalStep> {
    raws.iter()
        .flat_map(|raw| canonicalize_with(raw, deprecations).into_vec())
        .collect()
}

fn canonicalize_object(
    raw: &RawStep,
    object: &Map<String, Value>,
    type_name: &str,
    deprecations: &mut DeprecationCollector,
) -> CanonicalStep {
    let mut fields = object.clone();
    fields.remove("type");

    let Some((kind, legacy)) = resolve_type(type_name) else {
        return CanonicalStep::Passthrough(PassthroughStep {
            kind: type_name.to_string(),
            fields,
        });
    };

    if legacy {
        deprecations.record_type(type_name, kind.as_str());
    }

    // `{type: "delay", value: 500}` means a 500ms wait
    if kind == StepKind::Wait && is_delay_type(type_name) && !fields.contains_key("duration") {
        if let Some(value) = fields.remove("value") {
            deprecations.record_field("value", "duration");
            fields.insert("duration".to_string(), value);
        }
    }

    rename_aliases(kind, &mut fields, deprecations);

    if kind == StepKind::Fill {
        coerce_to_string(&mut fields, "value");
    }
    coerce_scalars(kind, &mut fields);

    let fields = Value::Object(fields);
    let parsed = match kind {
        StepKind::Viewport => parse::<ViewportStep>(fields).map(CanonicalStep::Viewport),
        StepKind::Wait => parse::<WaitStep>(fields).map(CanonicalStep::Wait),
        StepKind::Fill => parse::<FillStep>(fields).map(CanonicalStep::Fill),
        StepKind::Click => parse::<ClickStep>(fields).map(CanonicalStep::Click),
        StepKind::Scroll => parse::<ScrollStep>(fields).map(CanonicalStep::Scroll),
        StepKind::Screenshot => parse::<ScreenshotStep>(fields).map(CanonicalStep::Screenshot),
    };

    parsed.unwrap_or_else(|e| invalid(raw.0.clone(), &format!("{kind} step: {e}")))
}

fn rename_aliases(
    kind: StepKind,
    fields: &mut Map<String, Value>,
    deprecations: &mut DeprecationCollector,
) {
    for (canonical, aliases) in field_aliases(kind) {
        for alias in *aliases {
            let Some(value) = fields.remove(*alias) else {
                continue;
            };
            if fields.contains_key(*canonical) {
                deprecations.record_conflict(alias, canonical);
            } else {
                deprecations.record_field(alias, canonical);
                fields.insert((*canonical).to_string(), value);
            }
        }
    }
}

fn coerce_to_string(fields: &mut Map<String, Value>, key: &str) {
    let coerced = match fields.get(key) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => return,
    };
    fields.insert(key.to_string(), Value::String(coerced));
}

type FieldNames = &'static [&'static str];

/// Integer, float and boolean fields of each kind
fn scalar_fields(kind: StepKind) -> (FieldNames, FieldNames, FieldNames) {
    match kind {
        StepKind::Viewport => (
            &["width", "height"],
            &["deviceScaleFactor"],
            &["isMobile", "hasTouch", "isLandscape"],
        ),
        StepKind::Wait => (&["duration", "timeout"], &[], &[]),
        StepKind::Scroll => (&["y"], &[], &[]),
        StepKind::Fill => (&[], &[], &["submit"]),
        StepKind::Screenshot => (&[], &[], &["fullPage"]),
        StepKind::Click => (&[], &[], &[]),
    }
}

/// Accept `"500"` and `375.0` for integer fields, `"1.5"` for float fields
/// and `"true"` for boolean fields. Anything else is left for the parser to reject.
fn coerce_scalars(kind: StepKind, fields: &mut Map<String, Value>) {
    let (integers, floats, bools) = scalar_fields(kind);

    for key in integers {
        if let Some(value) = fields.get_mut(*key) {
            if let Some(n) = as_whole_number(value) {
                *value = Value::from(n);
            }
        }
    }
    for key in floats {
        if let Some(value) = fields.get_mut(*key) {
            let parsed = match value {
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
                _ => None,
            };
            if let Some(n) = parsed.and_then(serde_json::Number::from_f64) {
                *value = Value::Number(n);
            }
        }
    }
    for key in bools {
        if let Some(value) = fields.get_mut(*key) {
            let parsed = match value {
                Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
                Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
                _ => None,
            };
            if let Some(b) = parsed {
                *value = Value::Bool(b);
            }
        }
    }
}

fn as_whole_number(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(n) if n.is_f64() => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Some(n);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    let in_range = float.is_finite() && float.abs() < i64::MAX as f64;
    (in_range && float.fract() == 0.0).then_some(float as i64)
}

fn parse<T: DeserializeOwned>(fields: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(fields)
}

fn invalid(raw: Value, reason: &str) -> CanonicalStep {
    CanonicalStep::Invalid(InvalidStep {
        raw,
        reason: reason.to_string(),
    })
}

/// Expand `{type: "form", fields: ..., submit: ...}` into fill steps and an
/// optional submitting click.
///
/// `fields` is either an object of selector to value, or an array of step-like
/// objects (`{selector, value}`) that go through the regular fill aliases.
/// `submit` is a selector to click, or `true` to submit from the last field.
fn expand_form(
    raw: &RawStep,
    object: &Map<String, Value>,
    deprecations: &mut DeprecationCollector,
) -> Canonicalized {
    let mut steps = Vec::new();

    match object.get("fields") {
        Some(Value::Object(pairs)) => {
            for (selector, value) in pairs {
                let mut entry = Map::new();
                entry.insert("type".to_string(), Value::String("fill".to_string()));
                entry.insert("target".to_string(), Value::String(selector.clone()));
                entry.insert("value".to_string(), value.clone());
                steps.push(fill_entry(entry, deprecations));
            }
        }
        Some(Value::Array(entries)) => {
            for entry in entries {
                match entry {
                    Value::Object(map) => {
                        let mut entry = map.clone();
                        entry.insert("type".to_string(), Value::String("fill".to_string()));
                        steps.push(fill_entry(entry, deprecations));
                    }
                    other => steps.push(invalid(
                        other.clone(),
                        "form field entry must be a JSON object",
                    )),
                }
            }
        }
        _ => {
            return Canonicalized::One(invalid(
                raw.0.clone(),
                "form step requires 'fields' (object or array)",
            ));
        }
    }

    match object.get("submit") {
        Some(Value::String(selector)) => steps.push(CanonicalStep::click(selector.clone())),
        Some(Value::Bool(true)) => {
            if let Some(CanonicalStep::Fill(last)) = steps.last_mut() {
                last.submit = Some(true);
            }
        }
        _ => {}
    }

    Canonicalized::Many(steps)
}

fn fill_entry(entry: Map<String, Value>, deprecations: &mut DeprecationCollector) -> CanonicalStep {
    let raw = RawStep::new(Value::Object(entry));
    match raw.as_object() {
        Some(object) => canonicalize_object(&raw, object, "fill", deprecations),
        None => invalid(raw.0.clone(), "form field entry must be a JSON object"),
    }
}
