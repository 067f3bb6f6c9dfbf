//! Capture tool configuration

use pagecap_core::executor::{
    DEFAULT_DOM_BLOCK_LIMIT_BYTES, DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use pagecap_core::validate::DEFAULT_MAX_WAIT_DURATION_MS;
use pagecap_core::{ExecutionOptions, ImageFormat, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Capture tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Whether the capture tool is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-attempt navigation timeout in milliseconds
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Timeout for selector waits in milliseconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Longest fixed wait a step may request; longer waits are clamped
    #[serde(default = "default_max_wait_duration")]
    pub max_wait_duration_ms: u64,

    /// Byte ceiling for each extracted DOM block
    #[serde(default = "default_dom_block_limit")]
    pub dom_block_limit_bytes: usize,

    /// Encoding of captured images
    #[serde(default)]
    pub image_format: ImageFormat,

    /// Directory for saved captures; images are only returned inline when unset
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,

    /// Navigation retry defaults
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            navigation_timeout_ms: default_navigation_timeout(),
            wait_timeout_ms: default_wait_timeout(),
            max_wait_duration_ms: default_max_wait_duration(),
            dom_block_limit_bytes: default_dom_block_limit(),
            image_format: ImageFormat::default(),
            artifact_dir: None,
            retry: RetryConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Base retry policy; requests may override parts of it
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().into()
    }

    /// Executor limits derived from this configuration
    #[must_use]
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            navigation_timeout_ms: self.navigation_timeout_ms,
            wait_timeout_ms: self.wait_timeout_ms,
            dom_block_limit_bytes: self.dom_block_limit_bytes,
            image_format: self.image_format,
        }
    }

    /// Reject values the executor cannot work with
    pub fn validate(&self) -> pagecap_core::Result<()> {
        if self.navigation_timeout_ms == 0 {
            return Err(pagecap_core::Error::Config(
                "navigation_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.wait_timeout_ms == 0 {
            return Err(pagecap_core::Error::Config(
                "wait_timeout_ms must be greater than zero".to_string(),
            ));
        }
        self.retry_policy().validate()
    }
}

/// Retry section of the configuration file.
///
/// Keys are snake_case so environment overrides such as
/// `PAGECAP_CAPTURE__RETRY__MAX_RETRIES` map onto them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first navigation attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for a single delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// HTTP status codes worth retrying
    #[serde(default = "default_status_codes")]
    pub retryable_status_codes: Vec<u16>,

    /// Extra message fragments worth retrying
    #[serde(default)]
    pub retryable_error_patterns: Vec<String>,

    /// Randomize delays by up to 10%
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryPolicy::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay_ms: config.initial_delay_ms,
            max_delay_ms: config.max_delay_ms,
            backoff_multiplier: config.backoff_multiplier,
            retryable_status_codes: config.retryable_status_codes,
            retryable_error_patterns: config.retryable_error_patterns,
            jitter: config.jitter,
        }
    }
}

impl From<RetryPolicy> for RetryConfig {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_retries: policy.max_retries,
            initial_delay_ms: policy.initial_delay_ms,
            max_delay_ms: policy.max_delay_ms,
            backoff_multiplier: policy.backoff_multiplier,
            retryable_status_codes: policy.retryable_status_codes,
            retryable_error_patterns: policy.retryable_error_patterns,
            jitter: policy.jitter,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    DEFAULT_NAVIGATION_TIMEOUT_MS
}

fn default_wait_timeout() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

fn default_max_wait_duration() -> u64 {
    DEFAULT_MAX_WAIT_DURATION_MS
}

fn default_dom_block_limit() -> usize {
    DEFAULT_DOM_BLOCK_LIMIT_BYTES
}

fn default_max_retries() -> u32 {
    RetryPolicy::default().max_retries
}

fn default_initial_delay() -> u64 {
    RetryPolicy::default().initial_delay_ms
}

fn default_max_delay() -> u64 {
    RetryPolicy::default().max_delay_ms
}

fn default_backoff_multiplier() -> f64 {
    RetryPolicy::default().backoff_multiplier
}

fn default_status_codes() -> Vec<u16> {
    RetryPolicy::default().retryable_status_codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();
        assert!(config.enabled);
        assert_eq!(config.navigation_timeout_ms, 30_000);
        assert_eq!(config.max_wait_duration_ms, 30_000);
        assert_eq!(config.image_format, ImageFormat::Png);
        assert!(config.artifact_dir.is_none());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capture_config_deserialization() {
        let toml = r#"
            enabled = true
            navigation_timeout_ms = 15000
            image_format = "jpeg"
            artifact_dir = "/tmp/captures"

            [retry]
            max_retries = 1
            retryable_error_patterns = ["temporarily unavailable"]
        "#;

        let config: CaptureConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.navigation_timeout_ms, 15_000);
        assert_eq!(config.wait_timeout_ms, 10_000);
        assert_eq!(config.image_format, ImageFormat::Jpeg);
        assert_eq!(config.artifact_dir, Some(PathBuf::from("/tmp/captures")));

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.initial_delay_ms, 1_000);
        assert_eq!(policy.retryable_status_codes, vec![408, 429, 500, 502, 503, 504]);
        assert_eq!(policy.retryable_error_patterns, vec!["temporarily unavailable"]);

        let options = config.execution_options();
        assert_eq!(options.navigation_timeout_ms, 15_000);
        assert_eq!(options.image_format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_capture_config_validate() {
        let config = CaptureConfig {
            navigation_timeout_ms: 0,
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = CaptureConfig::default();
        config.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());
    }
}
