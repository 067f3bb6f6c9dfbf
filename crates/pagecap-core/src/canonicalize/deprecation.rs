//! Request-scoped deprecation tracking

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// What a deprecation notice refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeScope {
    /// A legacy step type name
    StepType,
    /// A legacy field name
    Field,
    /// An alias given alongside its canonical field
    Conflict,
}

/// A single deprecation notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationNotice {
    /// Legacy name used by the caller
    pub legacy: String,
    /// Canonical replacement
    pub canonical: String,
    /// Notice scope
    pub scope: NoticeScope,
}

impl DeprecationNotice {
    /// Human-readable message
    #[must_use]
    pub fn message(&self) -> String {
        match self.scope {
            NoticeScope::StepType => format!(
                "Step type '{}' is deprecated; use '{}'",
                self.legacy, self.canonical
            ),
            NoticeScope::Field => format!(
                "Field '{}' is deprecated; use '{}'",
                self.legacy, self.canonical
            ),
            NoticeScope::Conflict => format!(
                "Both '{}' and '{}' were given; kept '{}'",
                self.legacy, self.canonical, self.canonical
            ),
        }
    }
}

/// Collects deprecation notices for one request, each reported once.
///
/// Created by the caller per request and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct DeprecationCollector {
    seen: HashSet<(NoticeScope, String, String)>,
    notices: Vec<DeprecationNotice>,
}

impl DeprecationCollector {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a legacy step type name
    pub fn record_type(&mut self, legacy: &str, canonical: &str) {
        self.record(NoticeScope::StepType, legacy, canonical);
    }

    /// Record a legacy field name
    pub fn record_field(&mut self, legacy: &str, canonical: &str) {
        self.record(NoticeScope::Field, legacy, canonical);
    }

    /// Record an alias that lost to its canonical field
    pub fn record_conflict(&mut self, legacy: &str, canonical: &str) {
        self.record(NoticeScope::Conflict, legacy, canonical);
    }

    fn record(&mut self, scope: NoticeScope, legacy: &str, canonical: &str) {
        let key = (scope, legacy.to_string(), canonical.to_string());
        if !self.seen.insert(key) {
            return;
        }
        let notice = DeprecationNotice {
            legacy: legacy.to_string(),
            canonical: canonical.to_string(),
            scope,
        };
        warn!(legacy = legacy, canonical = canonical, "{}", notice.message());
        self.notices.push(notice);
    }

    /// Notices in the order they were first seen
    #[must_use]
    pub fn notices(&self) -> &[DeprecationNotice] {
        &self.notices
    }

    /// Notice messages in the order they were first seen
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.notices.iter().map(DeprecationNotice::message).collect()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
