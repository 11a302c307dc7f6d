//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/mmx/mmx.toml`
//! 3. Local config: `<map_dir>/.mmx.toml` (next to the map being edited)
//! 4. Environment variables: `MMX_*` prefix, `__` between section and key

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::codec::MAP_VERSION;
use crate::domain::LayoutSettings;

/// Document codec configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodecSettings {
    /// Reject nodes without (or with repeated) ids instead of assigning fresh ones
    pub require_ids: bool,
    /// Extension of the primary document, without dot
    pub primary_extension: String,
    /// Extension of the sidecar document, without dot
    pub sidecar_extension: String,
    /// Written to `<map version="...">`
    pub map_version: String,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            require_ids: false,
            primary_extension: "mm".into(),
            sidecar_extension: "mmx".into(),
            map_version: MAP_VERSION.into(),
        }
    }
}

/// Raw layout config for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutSettings {
    pub row_height: Option<f64>,
    pub char_width: Option<f64>,
    pub text_padding: Option<f64>,
    pub horizontal_gap: Option<f64>,
    pub origin_x: Option<f64>,
    pub origin_y: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCodecSettings {
    pub require_ids: Option<bool>,
    pub primary_extension: Option<String>,
    pub sidecar_extension: Option<String>,
    pub map_version: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub layout: RawLayoutSettings,
    pub codec: RawCodecSettings,
}

/// Unified configuration for mmx.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Geometry used by the layout engine
    pub layout: LayoutSettings,
    /// Document format options
    pub codec: CodecSettings,
}

/// Get the XDG config directory for mmx.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mmx").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("mmx.toml"))
}

/// Get the path to the local config file for maps in `map_dir`.
pub fn local_config_path(map_dir: &Path) -> PathBuf {
    map_dir.join(".mmx.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl LayoutSettings {
    fn merge(&self, overlay: &RawLayoutSettings) -> Self {
        Self {
            row_height: overlay.row_height.unwrap_or(self.row_height),
            char_width: overlay.char_width.unwrap_or(self.char_width),
            text_padding: overlay.text_padding.unwrap_or(self.text_padding),
            horizontal_gap: overlay.horizontal_gap.unwrap_or(self.horizontal_gap),
            origin_x: overlay.origin_x.unwrap_or(self.origin_x),
            origin_y: overlay.origin_y.unwrap_or(self.origin_y),
        }
    }
}

impl CodecSettings {
    fn merge(&self, overlay: &RawCodecSettings) -> Self {
        Self {
            require_ids: overlay.require_ids.unwrap_or(self.require_ids),
            primary_extension: overlay
                .primary_extension
                .clone()
                .unwrap_or_else(|| self.primary_extension.clone()),
            sidecar_extension: overlay
                .sidecar_extension
                .clone()
                .unwrap_or_else(|| self.sidecar_extension.clone()),
            map_version: overlay
                .map_version
                .clone()
                .unwrap_or_else(|| self.map_version.clone()),
        }
    }
}

impl Settings {
    /// Merge overlay config onto self (base): specified values win.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            layout: self.layout.merge(&overlay.layout),
            codec: self.codec.merge(&overlay.codec),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `map_dir` - Optional directory of the map being edited, for local config
    pub fn load(map_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config next to the map
        if let Some(dir) = map_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        // 4. Environment variables (explicit override)
        Self::apply_env_overrides(current)
    }

    /// Apply MMX_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("MMX")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        let layout = &mut settings.layout;
        for (key, slot) in [
            ("layout.row_height", &mut layout.row_height),
            ("layout.char_width", &mut layout.char_width),
            ("layout.text_padding", &mut layout.text_padding),
            ("layout.horizontal_gap", &mut layout.horizontal_gap),
            ("layout.origin_x", &mut layout.origin_x),
            ("layout.origin_y", &mut layout.origin_y),
        ] {
            if let Ok(val) = config.get_float(key) {
                *slot = val;
            }
        }
        if let Ok(val) = config.get_bool("codec.require_ids") {
            settings.codec.require_ids = val;
        }
        if let Ok(val) = config.get_string("codec.primary_extension") {
            settings.codec.primary_extension = val;
        }
        if let Ok(val) = config.get_string("codec.sidecar_extension") {
            settings.codec.sidecar_extension = val;
        }
        if let Ok(val) = config.get_string("codec.map_version") {
            settings.codec.map_version = val;
        }

        Ok(settings)
    }

    /// Serialize settings to TOML string.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {}", e),
        })
    }

    /// Get a template config file with comments.
    pub fn template() -> String {
        r#"# mmx configuration
# Global: ~/.config/mmx/mmx.toml
# Local:  <map directory>/.mmx.toml
# Environment overrides: MMX_LAYOUT__ROW_HEIGHT=24, MMX_CODEC__REQUIRE_IDS=true

[layout]
# Height of a leaf or folded node
row_height = 30.0
# Width estimate per character of a label
char_width = 9.0
# Added to the label estimate to get the node width
text_padding = 75.0
# Gap between a parent's right edge and its children
horizontal_gap = 50.0
# Position of the root node
origin_x = 50.0
origin_y = 400.0

[codec]
# Fail on nodes without ID instead of generating one
require_ids = false
primary_extension = "mm"
sidecar_extension = "mmx"
map_version = "1.0.1"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_overlay_when_merging_then_keeps_defaults() {
        let merged = Settings::default().merge_with(&RawSettings::default());
        assert_eq!(merged, Settings::default());
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_specified_values_change() {
        let overlay: RawSettings = toml::from_str(
            r#"
[layout]
row_height = 24.0

[codec]
require_ids = true
"#,
        )
        .unwrap();
        let merged = Settings::default().merge_with(&overlay);
        assert_eq!(merged.layout.row_height, 24.0);
        assert_eq!(merged.layout.char_width, 9.0);
        assert!(merged.codec.require_ids);
        assert_eq!(merged.codec.sidecar_extension, "mmx");
    }

    #[test]
    fn given_template_when_parsed_then_equals_defaults() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(Settings::default().merge_with(&raw), Settings::default());
    }

    #[test]
    fn given_settings_when_serialized_then_roundtrips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
