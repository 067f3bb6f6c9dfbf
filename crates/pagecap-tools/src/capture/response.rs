//! Response rendering
//!
//! Turns an [`ExecutionOutcome`] into the content blocks returned to the
//! caller: a text summary, the image, then any extracted DOM blocks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pagecap_core::{ExecutionOutcome, ExtractedBlock};
use serde::Serialize;
use std::fmt::Write as _;

/// One block of tool output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// Base64-encoded image
    Image {
        /// Encoded image bytes
        data: String,
        /// MIME type of the image
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentBlock {
    /// Text block
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Successful capture output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    /// Always true
    pub success: bool,
    /// Summary, image and DOM blocks
    pub content: Vec<ContentBlock>,
    /// Structured execution details
    pub outcome: ExecutionOutcome,
    /// Deprecation notices for legacy names in the request
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deprecations: Vec<String>,
    /// Warnings raised while preparing the steps
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CaptureResponse {
    /// Render an outcome
    #[must_use]
    pub fn new(
        url: &str,
        outcome: ExecutionOutcome,
        deprecations: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        let mut content = vec![ContentBlock::text(summary(url, &outcome))];
        content.push(ContentBlock::Image {
            data: STANDARD.encode(&outcome.artifact),
            mime_type: outcome.format.mime_type().to_string(),
        });
        content.extend(outcome.extracted.iter().map(dom_block));

        Self {
            success: true,
            content,
            outcome,
            deprecations,
            warnings,
        }
    }
}

/// Human-readable summary of an outcome
#[must_use]
pub fn summary(url: &str, outcome: &ExecutionOutcome) -> String {
    let mut text = format!("Captured {url}");
    if let Some(final_url) = outcome.final_url.as_deref().filter(|u| *u != url) {
        let _ = write!(text, " (final URL {final_url})");
    }
    text.push('\n');

    match &outcome.viewport {
        Some(viewport) => {
            let device = viewport.device.as_deref().unwrap_or("custom viewport");
            let _ = writeln!(text, "Device: {device} ({}x{})", viewport.width, viewport.height);
        }
        None => text.push_str("Device: default viewport\n"),
    }

    let _ = writeln!(
        text,
        "Capture: {} {}, {} bytes{}",
        if outcome.full_page { "full page" } else { "viewport" },
        outcome.format.extension(),
        outcome.artifact.len(),
        outcome
            .artifact_location
            .as_deref()
            .map(|location| format!(", saved to {location}"))
            .unwrap_or_default()
    );
    if outcome.retry_attempts > 0 {
        let _ = writeln!(text, "Navigation retries: {}", outcome.retry_attempts);
    }

    let failed = outcome.failed_steps();
    let _ = writeln!(
        text,
        "Steps: {} run, {} failed ({}ms)",
        outcome.step_results.len(),
        failed,
        outcome.execution_time_ms
    );
    for result in &outcome.step_results {
        let status = if result.success {
            "ok"
        } else if result.skipped {
            "skipped"
        } else {
            "failed"
        };
        let _ = write!(text, "  [{}] {} {status}", result.index, result.kind);
        if let Some(target) = &result.target {
            let _ = write!(text, " {target}");
        }
        if let Some(error) = &result.error {
            let _ = write!(text, ": {error}");
        }
        if let Some(note) = &result.note {
            let _ = write!(text, " ({note})");
        }
        text.push('\n');
    }
    text.trim_end().to_string()
}

fn dom_block(block: &ExtractedBlock) -> ContentBlock {
    let header = if block.truncated {
        format!(
            "DOM {} (truncated, {} of {} bytes):",
            block.kind.as_str(),
            block.content.len(),
            block.original_bytes
        )
    } else {
        format!("DOM {}:", block.kind.as_str())
    };
    ContentBlock::text(format!("{header}\n{}", block.content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecap_core::{DomExtract, ImageFormat, StepResult};
    use serde_json::json;

    fn step(index: usize, kind: &str, success: bool, error: Option<&str>) -> StepResult {
        StepResult {
            index,
            kind: kind.to_string(),
            target: Some(format!("#s{index}")),
            success,
            skipped: false,
            error: error.map(String::from),
            code: None,
            note: None,
            duration_ms: 3,
        }
    }

    fn outcome() -> ExecutionOutcome {
        ExecutionOutcome {
            step_results: vec![
                step(0, "click", false, Some("element not found: #s0")),
                step(1, "click", true, None),
            ],
            artifact: vec![1, 2, 3],
            format: ImageFormat::Png,
            full_page: false,
            retry_attempts: 1,
            extracted: vec![ExtractedBlock {
                kind: DomExtract::Text,
                content: "Hello".to_string(),
                truncated: true,
                original_bytes: 12,
            }],
            artifact_location: None,
            final_url: Some("https://example.com/".to_string()),
            http_status: Some(200),
            viewport: None,
            execution_time_ms: 42,
        }
    }

    #[test]
    fn test_summary_lists_steps() {
        let text = summary("https://example.com", &outcome());
        assert!(text.starts_with("Captured https://example.com (final URL https://example.com/)"));
        assert!(text.contains("Device: default viewport"));
        assert!(text.contains("viewport png, 3 bytes"));
        assert!(text.contains("Navigation retries: 1"));
        assert!(text.contains("Steps: 2 run, 1 failed"));
        assert!(text.contains("[0] click failed #s0: element not found"));
        assert!(text.contains("[1] click ok #s1"));
    }

    #[test]
    fn test_response_blocks() {
        let response = CaptureResponse::new("https://example.com", outcome(), Vec::new(), Vec::new());
        assert_eq!(response.content.len(), 3);
        assert_eq!(
            response.content[1],
            ContentBlock::Image {
                data: "AQID".to_string(),
                mime_type: "image/png".to_string(),
            }
        );

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["content"][1]["type"], json!("image"));
        assert_eq!(value["content"][1]["mimeType"], json!("image/png"));
        assert!(value["content"][2]["text"]
            .as_str()
            .is_some_and(|t| t.starts_with("DOM text (truncated, 5 of 12 bytes):")));
        assert_eq!(value["outcome"]["retryAttempts"], json!(1));
        assert!(value.get("deprecations").is_none());
    }
}
