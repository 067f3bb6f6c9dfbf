//! Legacy names accepted by the canonicalizer

use crate::steps::StepKind;

/// Legacy step type names and the kind they map to
pub(crate) const TYPE_ALIASES: &[(&str, StepKind)] = &[
    ("setViewport", StepKind::Viewport),
    ("set_viewport", StepKind::Viewport),
    ("emulate", StepKind::Viewport),
    ("device", StepKind::Viewport),
    ("resize", StepKind::Viewport),
    ("waitForSelector", StepKind::Wait),
    ("wait_for_selector", StepKind::Wait),
    ("waitFor", StepKind::Wait),
    ("waitForElement", StepKind::Wait),
    ("delay", StepKind::Wait),
    ("sleep", StepKind::Wait),
    ("pause", StepKind::Wait),
    ("type", StepKind::Fill),
    ("input", StepKind::Fill),
    ("fillInput", StepKind::Fill),
    ("fill_input", StepKind::Fill),
    ("typeText", StepKind::Fill),
    ("tap", StepKind::Click),
    ("press", StepKind::Click),
    ("clickElement", StepKind::Click),
    ("click_element", StepKind::Click),
    ("scrollTo", StepKind::Scroll),
    ("scroll_to", StepKind::Scroll),
    ("scrollIntoView", StepKind::Scroll),
    ("capture", StepKind::Screenshot),
    ("takeScreenshot", StepKind::Screenshot),
    ("take_screenshot", StepKind::Screenshot),
    ("snap", StepKind::Screenshot),
];

/// Legacy composite form step type names
pub(crate) const FORM_TYPES: &[&str] = &["form", "fillForm", "fill_form"];

/// Legacy wait types whose bare `value` means a duration
pub(crate) const DELAY_TYPES: &[&str] = &["delay", "sleep", "pause"];

type FieldAliases = &'static [(&'static str, &'static [&'static str])];

const VIEWPORT_FIELDS: FieldAliases = &[
    ("device", &["preset", "deviceName", "device_name"]),
    (
        "deviceScaleFactor",
        &["scale", "dpr", "pixelRatio", "device_scale_factor"],
    ),
    ("isMobile", &["mobile", "is_mobile"]),
    ("hasTouch", &["touch", "has_touch"]),
    ("isLandscape", &["landscape", "is_landscape"]),
    ("userAgent", &["ua", "user_agent"]),
];

const WAIT_FIELDS: FieldAliases = &[
    (
        "for",
        &["selector", "awaitElement", "waitFor", "element", "wait_for"],
    ),
    (
        "duration",
        &["ms", "time", "delay", "durationMs", "duration_ms"],
    ),
    ("timeout", &["timeoutMs", "timeout_ms"]),
];

const FILL_FIELDS: FieldAliases = &[
    ("target", &["selector", "element", "field", "input"]),
    ("value", &["text", "content"]),
    ("submit", &["pressEnter", "submitForm", "submit_form"]),
];

const CLICK_FIELDS: FieldAliases = &[
    ("target", &["selector", "element"]),
    (
        "waitFor",
        &["waitForSelector", "thenWaitFor", "awaitElement", "wait_for"],
    ),
];

const SCROLL_FIELDS: FieldAliases = &[
    ("to", &["selector", "element", "target"]),
    ("y", &["offset", "scrollY", "pixels"]),
];

const SCREENSHOT_FIELDS: FieldAliases = &[
    ("fullPage", &["full_page", "fullpage", "captureFullPage"]),
    ("element", &["selector", "target"]),
];

/// Field aliases for a step kind, as `(canonical, aliases)` pairs
pub(crate) fn field_aliases(kind: StepKind) -> FieldAliases {
    match kind {
        StepKind::Viewport => VIEWPORT_FIELDS,
        StepKind::Wait => WAIT_FIELDS,
        StepKind::Fill => FILL_FIELDS,
        StepKind::Click => CLICK_FIELDS,
        StepKind::Scroll => SCROLL_FIELDS,
        StepKind::Screenshot => SCREENSHOT_FIELDS,
    }
}

/// Resolve a step type name (canonical or legacy) to its kind.
///
/// Returns the kind and whether the name was a legacy alias.
pub(crate) fn resolve_type(name: &str) -> Option<(StepKind, bool)> {
    if let Some(kind) = StepKind::from_name(name) {
        return Some((kind, false));
    }
    if let Some(kind) = StepKind::ALL
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    {
        return Some((kind, true));
    }
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, kind)| (*kind, true))
}

/// Whether `name` is a composite form type
pub(crate) fn is_form_type(name: &str) -> bool {
    FORM_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name))
}

/// Whether `name` is a legacy delay type
pub(crate) fn is_delay_type(name: &str) -> bool {
    DELAY_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name))
}
