//! Step model
//!
//! Two layers: [`RawStep`] is whatever the caller sent (any JSON value with,
//! ideally, a `type` field) and [`CanonicalStep`] is the closed union every
//! later stage works on. Only the canonicalizer converts between them.

mod canonical;
mod raw;

pub use canonical::{
    CanonicalStep, ClickStep, FillStep, InvalidStep, PassthroughStep, ScreenshotStep, ScrollStep,
    StepKind, ViewportStep, WaitStep,
};
pub use raw::RawStep;
