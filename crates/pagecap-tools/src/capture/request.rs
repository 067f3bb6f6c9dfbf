//! Capture request parsing

use crate::error::{Error, Result};
use pagecap_core::{CaptureRequest, DomExtract, RawStep, RetryPolicy};
use serde_json::Value;
use std::collections::BTreeMap;

/// A parsed `capture_page` call
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureInput {
    /// Page to capture
    pub url: String,
    /// Steps exactly as supplied
    pub steps: Vec<RawStep>,
    /// Extra navigation headers
    pub headers: BTreeMap<String, String>,
    /// Only canonicalize, validate and order
    pub validate_only: bool,
    /// DOM blocks to extract after capture
    pub extract: Vec<DomExtract>,
    /// Default for screenshot steps without `fullPage`
    pub full_page: bool,
    /// Navigation retry policy after per-request overrides
    pub retry: RetryPolicy,
}

impl CaptureInput {
    /// Parse tool input.
    ///
    /// `retry` in the input is a partial policy layered over `base`.
    pub fn parse(input: &Value, base: &RetryPolicy) -> Result<Self> {
        let url = input
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::InvalidInput("Missing 'url' parameter".to_string()))?
            .to_string();

        let steps = match input.get("steps") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().cloned().map(RawStep::from).collect(),
            Some(_) => {
                return Err(Error::InvalidInput(
                    "'steps' must be an array of step objects".to_string(),
                ))
            }
        };

        let headers = parse_headers(input.get("headers"))?;
        let extract = parse_extract(input.get("extract"))?;

        let validate_only = optional_bool(input, &["validate"])?.unwrap_or(false);
        let full_page = optional_bool(input, &["fullPage", "full_page"])?.unwrap_or(false);

        let retry = match input.get("retry") {
            None | Some(Value::Null) => base.clone(),
            Some(overrides) => merge_retry(base, overrides)?,
        };

        Ok(Self {
            url,
            steps,
            headers,
            validate_only,
            extract,
            full_page,
            retry,
        })
    }

    /// Executor request for this input
    #[must_use]
    pub fn to_request(&self) -> CaptureRequest {
        let mut request = CaptureRequest::new(&self.url)
            .with_full_page(self.full_page)
            .with_retry_policy(self.retry.clone());
        for (name, value) in &self.headers {
            request = request.with_header(name, value);
        }
        for kind in &self.extract {
            request = request.with_extract(*kind);
        }
        request
    }
}

fn optional_bool(input: &Value, keys: &[&str]) -> Result<Option<bool>> {
    for key in keys {
        match input.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Bool(flag)) => return Ok(Some(*flag)),
            Some(_) => return Err(Error::InvalidInput(format!("'{key}' must be a boolean"))),
        }
    }
    Ok(None)
}

fn parse_headers(value: Option<&Value>) -> Result<BTreeMap<String, String>> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(BTreeMap::new());
    };
    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidInput("'headers' must be an object".to_string()))?;

    object
        .iter()
        .map(|(name, value)| match value {
            Value::String(text) => Ok((name.clone(), text.clone())),
            Value::Number(number) => Ok((name.clone(), number.to_string())),
            Value::Bool(flag) => Ok((name.clone(), flag.to_string())),
            _ => Err(Error::InvalidInput(format!(
                "header '{name}' must be a string"
            ))),
        })
        .collect()
}

fn parse_extract(value: Option<&Value>) -> Result<Vec<DomExtract>> {
    let names: Vec<&str> = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    Error::InvalidInput("'extract' entries must be strings".to_string())
                })
            })
            .collect::<Result<_>>()?,
        Some(_) => {
            return Err(Error::InvalidInput(
                "'extract' must be a string or an array of strings".to_string(),
            ))
        }
    };

    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        let kind = DomExtract::from_name(name).ok_or_else(|| {
            Error::InvalidInput(format!(
                "unknown extract '{name}' (expected html, text or tree)"
            ))
        })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn merge_retry(base: &RetryPolicy, overrides: &Value) -> Result<RetryPolicy> {
    let overrides = overrides
        .as_object()
        .ok_or_else(|| Error::InvalidInput("'retry' must be an object".to_string()))?;

    let mut merged = serde_json::to_value(base)?;
    if let Some(fields) = merged.as_object_mut() {
        for (key, value) in overrides {
            fields.insert(key.clone(), value.clone());
        }
    }

    let policy: RetryPolicy = serde_json::from_value(merged)
        .map_err(|e| Error::InvalidInput(format!("invalid 'retry' override: {e}")))?;
    policy.validate()?;
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_input() {
        let input = CaptureInput::parse(&json!({"url": "https://example.com"}), &RetryPolicy::default())
            .unwrap();
        assert_eq!(input.url, "https://example.com");
        assert!(input.steps.is_empty());
        assert!(!input.validate_only);
        assert!(!input.full_page);
        assert_eq!(input.retry, RetryPolicy::default());
    }

    #[test]
    fn test_parse_missing_url() {
        let err = CaptureInput::parse(&json!({"steps": []}), &RetryPolicy::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref msg) if msg.contains("url")));

        let err = CaptureInput::parse(&json!({"url": "  "}), &RetryPolicy::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_parse_full_input() {
        let input = CaptureInput::parse(
            &json!({
                "url": "https://example.com/search",
                "steps": [{"type": "click", "selector": "#go"}, "not a step"],
                "headers": {"Accept-Language": "en-US", "X-Trace": 7},
                "validate": true,
                "extract": ["text", "dom", "text"],
                "full_page": true
            }),
            &RetryPolicy::default(),
        )
        .unwrap();

        assert_eq!(input.steps.len(), 2);
        assert_eq!(input.steps[0].type_name(), Some("click"));
        assert_eq!(input.headers.get("X-Trace").map(String::as_str), Some("7"));
        assert!(input.validate_only);
        assert!(input.full_page);
        assert_eq!(input.extract, vec![DomExtract::Text, DomExtract::Html]);

        let request = input.to_request();
        assert_eq!(request.url, "https://example.com/search");
        assert!(request.full_page);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.extract.len(), 2);
    }

    #[test]
    fn test_parse_extract_single_and_unknown() {
        let input = CaptureInput::parse(
            &json!({"url": "https://example.com", "extract": "tree"}),
            &RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(input.extract, vec![DomExtract::Tree]);

        let err = CaptureInput::parse(
            &json!({"url": "https://example.com", "extract": ["pdf"]}),
            &RetryPolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown extract 'pdf'"));
    }

    #[test]
    fn test_parse_rejects_wrong_shapes() {
        let base = RetryPolicy::default();
        for input in [
            json!({"url": "https://example.com", "steps": {"type": "click"}}),
            json!({"url": "https://example.com", "headers": ["a"]}),
            json!({"url": "https://example.com", "validate": "yes"}),
            json!({"url": "https://example.com", "retry": 3}),
        ] {
            assert!(CaptureInput::parse(&input, &base).is_err(), "{input}");
        }
    }

    #[test]
    fn test_retry_override_is_partial() {
        let base = RetryPolicy::default().with_max_retries(5);
        let input = CaptureInput::parse(
            &json!({
                "url": "https://example.com",
                "retry": {"maxRetries": 1, "retryableErrorPatterns": ["busy"]}
            }),
            &base,
        )
        .unwrap();

        assert_eq!(input.retry.max_retries, 1);
        assert_eq!(input.retry.initial_delay_ms, base.initial_delay_ms);
        assert_eq!(input.retry.retryable_error_patterns, vec!["busy"]);
        assert_eq!(input.to_request().retry, input.retry);
    }

    #[test]
    fn test_retry_override_is_validated() {
        let err = CaptureInput::parse(
            &json!({"url": "https://example.com", "retry": {"backoffMultiplier": 0.5}}),
            &RetryPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Core(pagecap_core::Error::Config(_))));

        let err = CaptureInput::parse(
            &json!({"url": "https://example.com", "retry": {"maxRetries": -1}}),
            &RetryPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        for retry in [json!({"maxRetries": 1000}), json!({"maxDelayMs": u64::MAX})] {
            let err = CaptureInput::parse(
                &json!({"url": "https://example.com", "retry": retry}),
                &RetryPolicy::default(),
            )
            .unwrap_err();
            assert!(matches!(err, Error::Core(pagecap_core::Error::Config(_))), "{err}");
        }
    }
}
