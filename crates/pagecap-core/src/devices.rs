//! Device presets
//!
//! Read-only lookup data shared by every request for the life of the process.

use crate::steps::ViewportStep;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default viewport width when nothing else is specified
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
/// Default viewport height when nothing else is specified
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;

const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";
const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

/// A named viewport preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePreset {
    /// Preset name
    pub name: String,
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// Mobile emulation
    pub is_mobile: bool,
    /// Touch emulation
    pub has_touch: bool,
    /// User agent, if the preset overrides it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl DevicePreset {
    fn new(name: &str, width: u32, height: u32, scale: f64, mobile: bool, ua: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            device_scale_factor: scale,
            is_mobile: mobile,
            has_touch: mobile,
            user_agent: ua.map(String::from),
        }
    }
}

/// Fully resolved viewport handed to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedViewport {
    /// Preset the viewport was based on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// Mobile emulation
    pub is_mobile: bool,
    /// Touch emulation
    pub has_touch: bool,
    /// User agent override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Device preset table with alias lookup
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    presets: Vec<DevicePreset>,
    aliases: HashMap<String, String>,
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DeviceCatalog {
    /// Built-in presets and aliases
    #[must_use]
    pub fn builtin() -> Self {
        let presets = vec![
            DevicePreset::new("iPhone 14", 390, 844, 3.0, true, Some(IPHONE_UA)),
            DevicePreset::new("iPhone SE", 375, 667, 2.0, true, Some(IPHONE_UA)),
            DevicePreset::new("Pixel 7", 412, 915, 2.625, true, Some(ANDROID_UA)),
            DevicePreset::new("iPad Pro 11", 834, 1194, 2.0, true, Some(IPAD_UA)),
            DevicePreset::new("Laptop", 1366, 768, 1.0, false, None),
            DevicePreset::new("Desktop HD", 1920, 1080, 1.0, false, None),
        ];

        let aliases = [
            ("mobile", "iPhone 14"),
            ("phone", "iPhone 14"),
            ("iphone", "iPhone 14"),
            ("android", "Pixel 7"),
            ("pixel", "Pixel 7"),
            ("tablet", "iPad Pro 11"),
            ("ipad", "iPad Pro 11"),
            ("laptop", "Laptop"),
            ("desktop", "Desktop HD"),
            ("hd", "Desktop HD"),
        ]
        .into_iter()
        .map(|(alias, name)| (alias.to_string(), name.to_string()))
        .collect();

        Self { presets, aliases }
    }

    /// Add or replace a preset
    #[must_use]
    pub fn with_preset(mut self, preset: DevicePreset) -> Self {
        self.presets.retain(|p| p.name != preset.name);
        self.presets.push(preset);
        self
    }

    /// Add an alias for an existing preset name
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>, name: impl Into<String>) -> Self {
        self.aliases.insert(alias.into().to_lowercase(), name.into());
        self
    }

    /// All presets
    #[must_use]
    pub fn presets(&self) -> &[DevicePreset] {
        &self.presets
    }

    /// Alias table, sorted by alias
    #[must_use]
    pub fn aliases(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self
            .aliases
            .iter()
            .map(|(alias, name)| (alias.as_str(), name.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Find a preset by exact name, case-insensitive name, or alias
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&DevicePreset> {
        let trimmed = name.trim();
        if let Some(preset) = self.presets.iter().find(|p| p.name == trimmed) {
            return Some(preset);
        }
        if let Some(preset) = self
            .presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(trimmed))
        {
            return Some(preset);
        }
        let target = self.aliases.get(&trimmed.to_lowercase())?;
        self.presets.iter().find(|p| &p.name == target)
    }

    /// Resolve a viewport step into concrete dimensions.
    ///
    /// Explicit fields override the preset; `isLandscape` swaps width and
    /// height last. Unknown device names fall back to the defaults.
    #[must_use]
    pub fn resolve(&self, step: &ViewportStep) -> ResolvedViewport {
        let preset = step.device.as_deref().and_then(|name| self.lookup(name));

        let mut width = step
            .width
            .or(preset.map(|p| p.width))
            .unwrap_or(DEFAULT_VIEWPORT_WIDTH);
        let mut height = step
            .height
            .or(preset.map(|p| p.height))
            .unwrap_or(DEFAULT_VIEWPORT_HEIGHT);
        if step.is_landscape == Some(true) && height > width {
            std::mem::swap(&mut width, &mut height);
        }

        ResolvedViewport {
            device: preset.map(|p| p.name.clone()).or_else(|| step.device.clone()),
            width,
            height,
            device_scale_factor: step
                .device_scale_factor
                .or(preset.map(|p| p.device_scale_factor))
                .unwrap_or(1.0),
            is_mobile: step
                .is_mobile
                .or(preset.map(|p| p.is_mobile))
                .unwrap_or(false),
            has_touch: step
                .has_touch
                .or(preset.map(|p| p.has_touch))
                .unwrap_or(false),
            user_agent: step
                .user_agent
                .clone()
                .or_else(|| preset.and_then(|p| p.user_agent.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_alias_and_case() {
        let catalog = DeviceCatalog::builtin();
        assert_eq!(catalog.lookup("mobile").map(|p| p.name.as_str()), Some("iPhone 14"));
        assert_eq!(catalog.lookup("IPHONE 14").map(|p| p.name.as_str()), Some("iPhone 14"));
        assert_eq!(catalog.lookup(" Tablet ").map(|p| p.name.as_str()), Some("iPad Pro 11"));
        assert!(catalog.lookup("Nokia 3310").is_none());
    }

    #[test]
    fn test_resolve_landscape_swaps_dimensions() {
        let catalog = DeviceCatalog::builtin();
        let viewport = catalog.resolve(&ViewportStep {
            device: Some("mobile".to_string()),
            is_landscape: Some(true),
            ..Default::default()
        });
        assert_eq!((viewport.width, viewport.height), (844, 390));
        assert!(viewport.is_mobile);
        assert_eq!(viewport.device.as_deref(), Some("iPhone 14"));
    }

    #[test]
    fn test_explicit_fields_override_preset() {
        let catalog = DeviceCatalog::builtin();
        let viewport = catalog.resolve(&ViewportStep {
            device: Some("desktop".to_string()),
            width: Some(1440),
            device_scale_factor: Some(2.0),
            ..Default::default()
        });
        assert_eq!((viewport.width, viewport.height), (1440, 1080));
        assert_eq!(viewport.device_scale_factor, 2.0);
    }

    #[test]
    fn test_unknown_device_uses_defaults() {
        let catalog = DeviceCatalog::builtin();
        let viewport = catalog.resolve(&ViewportStep {
            device: Some("Custom Kiosk".to_string()),
            ..Default::default()
        });
        assert_eq!(
            (viewport.width, viewport.height),
            (DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT)
        );
        assert_eq!(viewport.device.as_deref(), Some("Custom Kiosk"));
    }

    #[test]
    fn test_custom_preset_and_alias() {
        let catalog = DeviceCatalog::builtin()
            .with_preset(DevicePreset::new("Kiosk", 1080, 1920, 1.0, false, None))
            .with_alias("Totem", "Kiosk");
        assert_eq!(catalog.lookup("totem").map(|p| p.width), Some(1080));
    }
}
