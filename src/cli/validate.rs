//! `pagecap validate`

use anyhow::{bail, Context, Result};
use pagecap_core::{RawStep, ValidationContext};
use pagecap_tools::analyze;
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncReadExt;

pub async fn run(url: &str, steps: Option<&Path>) -> Result<()> {
    let config = crate::config::load_config()?;
    let devices = config.device_catalog();

    let raw = match steps {
        Some(path) => parse_steps(&read_source(path).await?)?,
        None => Vec::new(),
    };

    let context = ValidationContext::new(url, &devices)
        .with_max_wait_duration(config.capture.max_wait_duration_ms);
    let report = analyze(&raw, &context);

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.validation.valid {
        std::process::exit(1);
    }
    Ok(())
}

async fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read steps from stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Accepts a bare step array or a request object with a `steps` array
fn parse_steps(text: &str) -> Result<Vec<RawStep>> {
    let value: Value = serde_json::from_str(text).context("Steps are not valid JSON")?;
    let steps = match value {
        Value::Array(items) => items,
        Value::Object(mut request) => match request.remove("steps") {
            Some(Value::Array(items)) => items,
            Some(_) => bail!("'steps' must be an array"),
            None => Vec::new(),
        },
        _ => bail!("expected a step array or an object with 'steps'"),
    };
    Ok(steps.into_iter().map(RawStep::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps_shapes() {
        let steps = parse_steps(r##"[{"type": "click", "target": "#a"}]"##).unwrap();
        assert_eq!(steps.len(), 1);

        let steps =
            parse_steps(r#"{"url": "https://example.com", "steps": [{"type": "wait"}]}"#).unwrap();
        assert_eq!(steps[0].type_name(), Some("wait"));

        assert!(parse_steps("42").is_err());
        assert!(parse_steps("{\"steps\": 1}").is_err());
        assert!(parse_steps("not json").is_err());
    }

    #[tokio::test]
    async fn test_read_steps_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.json");
        std::fs::write(&path, r#"[{"type": "screenshot"}]"#).unwrap();

        let text = tokio_test::assert_ok!(read_source(&path).await);
        assert_eq!(parse_steps(&text).unwrap().len(), 1);
        assert!(read_source(&dir.path().join("missing.json")).await.is_err());
    }
}
