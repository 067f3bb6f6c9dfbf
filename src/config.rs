//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use pagecap_core::{DeviceCatalog, DevicePreset};
use pagecap_tools::CaptureConfig;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Capture tool settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Extra device presets
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,

    /// Extra device aliases (alias -> preset name)
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// A device preset as written in the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_scale")]
    pub device_scale_factor: f64,
    #[serde(default)]
    pub is_mobile: bool,
    #[serde(default)]
    pub has_touch: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_scale() -> f64 {
    1.0
}

impl From<DeviceConfig> for DevicePreset {
    fn from(device: DeviceConfig) -> Self {
        Self {
            name: device.name,
            width: device.width,
            height: device.height,
            device_scale_factor: device.device_scale_factor,
            is_mobile: device.is_mobile,
            has_touch: device.has_touch,
            user_agent: device.user_agent,
        }
    }
}

impl AppConfig {
    /// Built-in device catalog extended with configured presets and aliases
    pub fn device_catalog(&self) -> DeviceCatalog {
        let catalog = self
            .devices
            .iter()
            .cloned()
            .fold(DeviceCatalog::builtin(), |catalog, device| {
                catalog.with_preset(device.into())
            });
        self.aliases
            .iter()
            .fold(catalog, |catalog, (alias, name)| catalog.with_alias(alias, name))
    }
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") makes PAGECAP_CAPTURE__X work (single _ after prefix).
        .add_source(
            Environment::with_prefix("PAGECAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    app.capture
        .validate()
        .context("Invalid capture configuration")?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_embedded_defaults_match_code_defaults() {
        let config = parse("");
        assert_eq!(config.capture, CaptureConfig::default());
        assert!(config.devices.is_empty());
        assert!(config.capture.validate().is_ok());
    }

    #[test]
    fn test_overrides_and_extra_devices() {
        let config = parse(
            r#"
            [capture]
            image_format = "jpeg"

            [capture.retry]
            max_retries = 1

            [[devices]]
            name = "Kiosk"
            width = 1080
            height = 1920

            [aliases]
            totem = "Kiosk"
            "#,
        );

        assert_eq!(config.capture.retry_policy().max_retries, 1);
        assert_eq!(config.capture.retry_policy().max_delay_ms, 10_000);

        let catalog = config.device_catalog();
        let kiosk = catalog.lookup("totem").unwrap();
        assert_eq!((kiosk.width, kiosk.height), (1080, 1920));
        assert_eq!(kiosk.device_scale_factor, 1.0);
        assert!(catalog.lookup("iPhone 14").is_some());
    }
}
