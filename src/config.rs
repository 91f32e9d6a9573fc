//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{APP_DIR_NAME, CONFIG_DIR_ENV};
use crate::export::zmk::{DEFAULT_DISPLAY_NAME, DEFAULT_NODE_NAME};
use crate::models::{LayoutDocument, DEFAULT_PITCH_MM};
use crate::services::geometry::{BASE_UNIT_PX, SNAP_THRESHOLD_PX};

/// Editing defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Physical size of one unit in millimeters
    pub unit_pitch_mm: f64,
    /// Corner distance (pixels) within which a dragged key snaps
    pub snap_threshold_px: f64,
    /// Pixels per unit at the default pitch
    pub base_unit_px: f64,
    /// Maximum number of undo steps (unbounded if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            unit_pitch_mm: DEFAULT_PITCH_MM,
            snap_threshold_px: SNAP_THRESHOLD_PX,
            base_unit_px: BASE_UNIT_PX,
            history_limit: None,
        }
    }
}

/// Export file names and identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default ZMK output file name
    pub zmk_file_name: String,
    /// Default QMK keymap output file name
    pub qmk_file_name: String,
    /// Default QMK info.json output file name
    pub qmk_info_file_name: String,
    /// Devicetree node name of the exported physical layout
    pub layout_node_name: String,
    /// `display-name` of the exported physical layout
    pub layout_display_name: String,
    /// Layout name used in info.json exports
    pub qmk_layout_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            zmk_file_name: "layout.keymap".to_string(),
            qmk_file_name: "layout_qmk.json".to_string(),
            qmk_info_file_name: "info.json".to_string(),
            layout_node_name: DEFAULT_NODE_NAME.to_string(),
            layout_display_name: DEFAULT_DISPLAY_NAME.to_string(),
            qmk_layout_name: "LAYOUT".to_string(),
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/LazyLayout/config.toml`
/// - macOS: `~/Library/Application Support/LazyLayout/config.toml`
/// - Windows: `%APPDATA%\LazyLayout\config.toml`
///
/// # Validation
///
/// - `unit_pitch_mm` and `base_unit_px` must be finite and positive
/// - `snap_threshold_px` must be finite and not negative
/// - `history_limit`, when set, must be at least 1
/// - export file names must not be empty
/// - `layout_node_name` must be a devicetree node name (`[a-z][a-z0-9_-]*`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Editing defaults
    #[serde(default)]
    pub editor: EditorConfig,
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the config file exists on disk.
    ///
    /// Returns true if config.toml exists, false otherwise.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/LazyLayout/`
    /// - macOS: `~/Library/Application Support/LazyLayout/`
    /// - Windows: `%APPDATA%\LazyLayout\`
    ///
    /// `LAZYLAYOUT_CONFIG_DIR` takes precedence when set.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the platform config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates configuration from a specific file.
    ///
    /// Missing sections and fields take their default values.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Saves configuration to the platform config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to `path` using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        // Ensure config directory exists
        if let Some(config_dir) = path.parent() {
            fs::create_dir_all(config_dir).with_context(|| {
                format!("Failed to create config directory: {}", config_dir.display())
            })?;
        }

        // Serialize to TOML
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = path.with_extension("toml.tmp");

        // Write to temp file
        fs::write(&temp_path, content).with_context(|| {
            format!("Failed to write temp config file: {}", temp_path.display())
        })?;

        // Atomic rename
        fs::rename(&temp_path, path).with_context(|| {
            format!("Failed to rename temp config file to: {}", path.display())
        })?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        let editor = &self.editor;

        if !(editor.unit_pitch_mm.is_finite() && editor.unit_pitch_mm > 0.0) {
            anyhow::bail!(
                "editor.unit_pitch_mm must be a positive number, got {}",
                editor.unit_pitch_mm
            );
        }
        if !(editor.base_unit_px.is_finite() && editor.base_unit_px > 0.0) {
            anyhow::bail!(
                "editor.base_unit_px must be a positive number, got {}",
                editor.base_unit_px
            );
        }
        if !(editor.snap_threshold_px.is_finite() && editor.snap_threshold_px >= 0.0) {
            anyhow::bail!(
                "editor.snap_threshold_px must not be negative, got {}",
                editor.snap_threshold_px
            );
        }
        if editor.history_limit == Some(0) {
            anyhow::bail!("editor.history_limit must be at least 1 when set");
        }

        let export = &self.export;
        for (field, value) in [
            ("zmk_file_name", &export.zmk_file_name),
            ("qmk_file_name", &export.qmk_file_name),
            ("qmk_info_file_name", &export.qmk_info_file_name),
            ("qmk_layout_name", &export.qmk_layout_name),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("export.{field} must not be empty");
            }
        }
        if !is_node_name(&export.layout_node_name) {
            anyhow::bail!(
                "export.layout_node_name is not a valid devicetree node name: {:?}",
                export.layout_node_name
            );
        }

        Ok(())
    }

    /// Corner distance (pixels) within which a dragged key snaps.
    #[must_use]
    pub fn snap_threshold(&self) -> f64 {
        self.editor.snap_threshold_px
    }

    /// Pixels per unit at the configured pitch.
    #[must_use]
    pub fn unit_px(&self) -> f64 {
        crate::services::geometry::unit_px_for_pitch(
            self.editor.base_unit_px,
            self.editor.unit_pitch_mm,
        )
    }

    /// Creates an empty document with the configured pitch and history cap.
    #[must_use]
    pub fn new_document(&self) -> LayoutDocument {
        let mut document = LayoutDocument::with_history_limit(self.editor.history_limit);
        document.set_unit_pitch(self.editor.unit_pitch_mm);
        document
    }
}

/// Lowercase devicetree node name: a letter followed by letters, digits, `_` or `-`.
fn is_node_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
