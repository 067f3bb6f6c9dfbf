//! Validate-only analysis
//!
//! Runs the preparation stages and describes what an execution would do,
//! without touching a backend.

use pagecap_core::steps::{ScrollStep, ViewportStep};
use pagecap_core::{
    prepare, CanonicalStep, DeviceCatalog, PreparedSteps, RawStep, ValidationContext,
    ValidationResult,
};
use serde::Serialize;

/// Fixed cost of one capture (browser setup, navigation, encoding)
const BASE_ESTIMATE_MS: u64 = 2_000;
/// Estimated cost of each ordered step
const PER_STEP_ESTIMATE_MS: u64 = 1_000;

/// One ordered step, described for a caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAnalysis {
    /// Position in the ordered sequence
    pub index: usize,
    /// Step type
    #[serde(rename = "type")]
    pub kind: String,
    /// Selector the step acts on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// What the step will do
    pub description: String,
}

/// Result of a validate-only request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Requested URL
    pub url: String,
    /// Validation findings
    pub validation: ValidationResult,
    /// Per-step descriptions of the ordered sequence
    pub steps: Vec<StepAnalysis>,
    /// The sequence an execution would run
    pub ordered_steps: Vec<CanonicalStep>,
    /// Deprecation notices for legacy names in the request
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deprecations: Vec<String>,
    /// Rough execution time
    pub estimated_time_ms: u64,
}

impl ValidationReport {
    /// Describe already-prepared steps
    #[must_use]
    pub fn from_prepared(url: &str, prepared: &PreparedSteps, devices: &DeviceCatalog) -> Self {
        let steps = prepared
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepAnalysis {
                index,
                kind: step.type_name().to_string(),
                target: step.target().map(String::from),
                description: describe(step, devices),
            })
            .collect();

        Self {
            url: url.to_string(),
            validation: prepared.validation.clone(),
            steps,
            ordered_steps: prepared.steps.clone(),
            deprecations: prepared.deprecations.clone(),
            estimated_time_ms: estimate_time_ms(prepared.steps.len()),
        }
    }
}

/// Prepare `steps` for `context.url` and describe the result
#[must_use]
pub fn analyze(steps: &[RawStep], context: &ValidationContext<'_>) -> ValidationReport {
    let prepared = prepare(steps, context);
    ValidationReport::from_prepared(context.url, &prepared, context.devices)
}

/// Estimated wall time for an ordered sequence of `step_count` steps
#[must_use]
pub fn estimate_time_ms(step_count: usize) -> u64 {
    BASE_ESTIMATE_MS + PER_STEP_ESTIMATE_MS * step_count as u64
}

fn describe(step: &CanonicalStep, devices: &DeviceCatalog) -> String {
    match step {
        CanonicalStep::Viewport(viewport) => describe_viewport(viewport, devices),
        CanonicalStep::Wait(wait) => match (&wait.for_selector, wait.duration) {
            (Some(selector), _) => match wait.timeout {
                Some(timeout) => format!("Wait up to {timeout}ms for {selector}"),
                None => format!("Wait for {selector}"),
            },
            (None, Some(ms)) => format!("Wait {ms}ms"),
            (None, None) => "Wait (missing 'for' or 'duration')".to_string(),
        },
        CanonicalStep::Fill(fill) => {
            let target = fill.target.as_deref().unwrap_or("?");
            let chars = fill.value.as_deref().map_or(0, |v| v.chars().count());
            if fill.submit == Some(true) {
                format!("Fill {target} ({chars} chars) and submit")
            } else {
                format!("Fill {target} ({chars} chars)")
            }
        }
        CanonicalStep::Click(click) => {
            let target = click.target.as_deref().unwrap_or("?");
            match &click.wait_for {
                Some(selector) => format!("Click {target}, then wait for {selector}"),
                None => format!("Click {target}"),
            }
        }
        CanonicalStep::Scroll(scroll) => describe_scroll(scroll),
        CanonicalStep::Screenshot(shot) => match (&shot.element, shot.full_page) {
            (Some(element), _) => format!("Capture element {element}"),
            (None, Some(true)) => "Capture full page".to_string(),
            (None, _) => "Capture viewport".to_string(),
        },
        CanonicalStep::Passthrough(step) => format!("Run custom step '{}'", step.kind),
        CanonicalStep::Invalid(step) => format!("Invalid step: {}", step.reason),
    }
}

fn describe_viewport(step: &ViewportStep, devices: &DeviceCatalog) -> String {
    let resolved = devices.resolve(step);
    match &resolved.device {
        Some(device) => format!(
            "Emulate {device} ({}x{})",
            resolved.width, resolved.height
        ),
        None => format!("Set viewport to {}x{}", resolved.width, resolved.height),
    }
}

fn describe_scroll(step: &ScrollStep) -> String {
    match (&step.to, step.y) {
        (Some(selector), _) => format!("Scroll to {selector}"),
        (None, Some(y)) => format!("Scroll to y={y}"),
        (None, None) => "Scroll to top".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(values: Vec<serde_json::Value>) -> Vec<RawStep> {
        values.into_iter().map(RawStep::from).collect()
    }

    #[test]
    fn test_analyze_orders_and_estimates() {
        let devices = DeviceCatalog::builtin();
        let context = ValidationContext::new("https://example.com", &devices);
        let report = analyze(
            &raw(vec![
                json!({"type": "click", "selector": "button"}),
                json!({"type": "viewport", "device": "iPhone 14"}),
            ]),
            &context,
        );

        assert!(report.validation.valid);
        assert_eq!(report.ordered_steps.len(), 3);
        assert_eq!(report.estimated_time_ms, 5_000);
        assert_eq!(report.steps[0].kind, "viewport");
        assert_eq!(report.steps[0].description, "Emulate iPhone 14 (390x844)");
        assert_eq!(report.steps[1].description, "Click button");
        assert_eq!(report.steps[1].target.as_deref(), Some("button"));
        assert_eq!(report.steps[2].description, "Capture viewport");
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let devices = DeviceCatalog::builtin();
        let context = ValidationContext::new("https://example.com", &devices);
        let report = analyze(
            &raw(vec![json!({"type": "waitForSelector", "awaitElement": ".x"})]),
            &context,
        );

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["orderedSteps"][0], json!({"type": "wait", "for": ".x"}));
        assert_eq!(value["steps"][0]["type"], json!("wait"));
        assert_eq!(value["validation"]["canProceed"], json!(true));
        assert_eq!(value["estimatedTimeMs"], json!(4_000));
        assert!(value["deprecations"][0]
            .as_str()
            .is_some_and(|m| m.contains("waitForSelector")));
    }

    #[test]
    fn test_invalid_request_is_reported_not_executed() {
        let devices = DeviceCatalog::builtin();
        let context = ValidationContext::new("https://example.com", &devices);
        let report = analyze(&raw(vec![json!({"type": "wait"})]), &context);

        assert!(!report.validation.valid);
        assert!(report.validation.errors[0].contains("requires 'for'"));
        assert!(report
            .steps
            .iter()
            .any(|s| s.description.contains("missing 'for'")));
    }

    #[test]
    fn test_describe_variants() {
        let devices = DeviceCatalog::builtin();
        assert_eq!(describe(&CanonicalStep::wait_ms(500), &devices), "Wait 500ms");
        assert_eq!(
            describe(&CanonicalStep::fill("#q", "rust"), &devices),
            "Fill #q (4 chars)"
        );
        assert_eq!(
            describe_scroll(&ScrollStep {
                y: Some(800),
                ..Default::default()
            }),
            "Scroll to y=800"
        );
        assert_eq!(describe_scroll(&ScrollStep::default()), "Scroll to top");
    }
}
