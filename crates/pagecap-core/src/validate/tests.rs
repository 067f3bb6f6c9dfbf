//! Tests for the validator

use super::*;
use crate::steps::{ClickStep, FillStep, InvalidStep, ScreenshotStep, ViewportStep, WaitStep};
use serde_json::json;

const URL: &str = "https://example.com";

fn run(steps: &[CanonicalStep]) -> ValidationResult {
    let devices = DeviceCatalog::builtin();
    validate(steps, &ValidationContext::new(URL, &devices))
}

#[test]
fn test_empty_wait_is_an_error() {
    let result = run(&[CanonicalStep::Wait(WaitStep::default())]);
    assert!(!result.valid);
    assert!(!result.can_proceed);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("requires 'for'"));
    assert_eq!(result.issues[0].code, ErrorCode::ValidationFailed);
    assert_eq!(result.issues[0].step, Some(0));
}

#[test]
fn test_warnings_never_block() {
    let result = run(&[
        CanonicalStep::click(".late-button"),
        CanonicalStep::screenshot(),
        CanonicalStep::click("#after"),
    ]);
    assert!(result.warnings.len() >= 2);
    assert!(result.errors.is_empty());
    assert!(result.valid);
    assert_eq!(result.valid, result.can_proceed);
}

#[test]
fn test_missing_required_fields() {
    let result = run(&[
        CanonicalStep::Fill(FillStep {
            target: Some("#q".to_string()),
            ..Default::default()
        }),
        CanonicalStep::Fill(FillStep {
            value: Some("x".to_string()),
            ..Default::default()
        }),
        CanonicalStep::Click(ClickStep::default()),
    ]);
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors[0].contains("fill requires 'value'"));
    assert!(result.errors[1].contains("fill requires 'target'"));
    assert!(result.errors[2].contains("click requires 'target'"));
    assert!(!result.valid);
}

#[test]
fn test_selector_trimming_is_a_correction() {
    let result = run(&[
        CanonicalStep::wait_for("  #main "),
        CanonicalStep::click("#main\n"),
    ]);
    assert!(result.valid);
    assert_eq!(result.corrections.len(), 2);
    assert_eq!(result.corrections[0].field, "for");
    assert_eq!(result.corrections[0].to, json!("#main"));

    let corrected = result.corrected_steps.expect("corrected steps");
    assert_eq!(corrected[0].target(), Some("#main"));
    assert_eq!(corrected[1].target(), Some("#main"));
}

#[test]
fn test_blank_selector_becomes_missing() {
    let result = run(&[CanonicalStep::click("   ")]);
    assert_eq!(result.corrections[0].to, Value::Null);
    assert!(result.errors[0].contains("click requires 'target'"));
}

#[test]
fn test_no_corrected_steps_when_nothing_changed() {
    let result = run(&[CanonicalStep::click("button"), CanonicalStep::screenshot()]);
    assert!(result.corrections.is_empty());
    assert!(result.corrected_steps.is_none());
}

#[test]
fn test_device_alias_resolved() {
    let result = run(&[CanonicalStep::viewport_device("mobile")]);
    assert_eq!(result.corrections.len(), 1);
    assert_eq!(result.corrections[0].from, json!("mobile"));
    assert_eq!(result.corrections[0].to, json!("iPhone 14"));
    assert!(result.valid);
}

#[test]
fn test_unknown_device_is_a_warning() {
    let result = run(&[CanonicalStep::Viewport(ViewportStep {
        device: Some("Smart Fridge".to_string()),
        ..Default::default()
    })]);
    assert!(result.valid);
    assert!(result.warnings[0].contains("unknown device 'Smart Fridge'"));
    assert!(result.corrections.is_empty());
}

#[test]
fn test_dynamic_selector_without_wait_warns() {
    let result = run(&[CanonicalStep::click(".cookie-accept")]);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("\"for\": \".cookie-accept\""));
}

#[test]
fn test_preceding_wait_silences_dynamic_warning() {
    let result = run(&[
        CanonicalStep::wait_for(".cookie-accept"),
        CanonicalStep::click(".cookie-accept"),
        CanonicalStep::Click(ClickStep {
            target: Some(".open-menu".to_string()),
            wait_for: Some(".menu-item".to_string()),
            ..Default::default()
        }),
        CanonicalStep::click(".menu-item"),
    ]);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains(".open-menu"));
}

#[test]
fn test_static_selector_does_not_warn() {
    let result = run(&[
        CanonicalStep::click("#submit"),
        CanonicalStep::fill("input", "x"),
    ]);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_wait_after_screenshot_does_not_warn() {
    let result = run(&[CanonicalStep::screenshot(), CanonicalStep::wait_ms(100)]);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_first_viewport_after_screenshot_does_not_warn() {
    let viewport = |width| {
        CanonicalStep::Viewport(ViewportStep {
            width: Some(width),
            height: Some(800),
            ..ViewportStep::default()
        })
    };

    let result = run(&[CanonicalStep::screenshot(), viewport(1280)]);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let result = run(&[CanonicalStep::screenshot(), viewport(1280), viewport(390)]);
    let late: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| w.contains("runs after the screenshot"))
        .collect();
    assert_eq!(late.len(), 1);
    assert!(late[0].starts_with("step[2] (viewport)"));
}

#[test]
fn test_wait_with_both_conditions_warns() {
    let result = run(&[CanonicalStep::Wait(WaitStep {
        for_selector: Some("#x".to_string()),
        duration: Some(100),
        ..Default::default()
    })]);
    assert!(result.valid);
    assert!(result.warnings[0].contains("both 'for' and 'duration'"));
}

#[test]
fn test_long_wait_is_clamped() {
    let result = run(&[CanonicalStep::wait_ms(120_000)]);
    assert_eq!(result.corrections[0].field, "duration");
    assert_eq!(result.corrections[0].to, json!(DEFAULT_MAX_WAIT_DURATION_MS));
    match &result.corrected_steps.expect("corrected")[0] {
        CanonicalStep::Wait(wait) => assert_eq!(wait.duration, Some(DEFAULT_MAX_WAIT_DURATION_MS)),
        other => panic!("expected wait, got {:?}", other),
    }
}

#[test]
fn test_duplicate_viewports_warn() {
    let result = run(&[
        CanonicalStep::viewport_device("Laptop"),
        CanonicalStep::screenshot(),
        CanonicalStep::viewport_device("iPhone 14"),
    ]);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.starts_with("2 viewport steps")));
}

#[test]
fn test_invalid_url() {
    let devices = DeviceCatalog::builtin();
    for url in ["example.com", "ftp://example.com/file", ""] {
        let result = validate(
            &[CanonicalStep::screenshot()],
            &ValidationContext::new(url, &devices),
        );
        assert!(!result.valid, "{url} should be rejected");
        assert_eq!(result.issues[0].code, ErrorCode::InvalidUrl);
    }
}

#[test]
fn test_invalid_and_passthrough_steps() {
    let result = run(&[
        CanonicalStep::Invalid(InvalidStep {
            raw: json!({"selector": "a"}),
            reason: "missing 'type' discriminator".to_string(),
        }),
        CanonicalStep::Passthrough(crate::steps::PassthroughStep {
            kind: "hover".to_string(),
            fields: serde_json::Map::new(),
        }),
    ]);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("missing 'type'"));
    assert!(result.warnings[0].contains("unknown step type"));
}

#[test]
fn test_serialized_shape() {
    let value = serde_json::to_value(run(&[CanonicalStep::wait_for(" a ")])).unwrap();
    assert_eq!(value["canProceed"], json!(true));
    assert_eq!(value["corrections"][0]["stepIndex"], json!(0));
    assert!(value.get("issues").is_none());
    assert!(value.get("correctedSteps").is_some());
}

#[test]
fn test_suggested_steps() {
    let steps = vec![
        CanonicalStep::Wait(WaitStep::default()),
        CanonicalStep::Click(ClickStep::default()),
        CanonicalStep::fill("#q", "x"),
        CanonicalStep::Screenshot(ScreenshotStep::default()),
    ];
    let fixed = suggested_steps(&steps);
    assert_eq!(fixed.len(), 3);
    assert_eq!(fixed[0].to_value(), json!({"type": "wait", "duration": 1000}));
    assert!(run(&fixed).valid);
}
