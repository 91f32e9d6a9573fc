//! Layout file I/O service.
//!
//! This module centralizes all layout file operations, providing a consistent
//! interface for loading layouts in any supported import format, rendering
//! them in an export format, and writing the result to disk.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::{Config, ExportConfig};
use crate::export::{self, ZmkExportOptions};
use crate::models::{KeyLayout, LayoutDocument};
use crate::parser::{self, ImportError};

/// A format layouts can be imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutFormat {
    /// keyboard-layout-editor.com JSON
    Kle,
    /// ZMK devicetree
    Zmk,
}

impl LayoutFormat {
    /// Short name as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Kle => "kle",
            Self::Zmk => "zmk",
        }
    }

    /// Guesses the format from a file extension.
    ///
    /// - `.json`, `.json5`, `.kle` → KLE
    /// - `.keymap`, `.dtsi`, `.overlay`, `.dts` → ZMK
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" | "json5" | "kle" => Some(Self::Kle),
            "keymap" | "dtsi" | "overlay" | "dts" => Some(Self::Zmk),
            _ => None,
        }
    }

    /// Parses `text` in this format.
    pub fn import(self, text: &str) -> Result<Vec<KeyLayout>, ImportError> {
        match self {
            Self::Kle => parser::import_kle_str(text),
            Self::Zmk => parser::import_zmk(text),
        }
    }
}

impl fmt::Display for LayoutFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kle" => Ok(Self::Kle),
            "zmk" => Ok(Self::Zmk),
            other => Err(format!("unknown input format '{other}' (expected kle or zmk)")),
        }
    }
}

/// A format layouts can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// ZMK devicetree with physical layout, position map and keymap
    Zmk,
    /// Flat QMK keymap JSON
    Qmk,
    /// QMK info.json layout fragment
    QmkInfo,
}

impl ExportFormat {
    /// Short name as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zmk => "zmk",
            Self::Qmk => "qmk",
            Self::QmkInfo => "qmk-info",
        }
    }

    /// Conventional output file name for this format.
    #[must_use]
    pub fn default_file_name(self, export: &ExportConfig) -> &str {
        match self {
            Self::Zmk => &export.zmk_file_name,
            Self::Qmk => &export.qmk_file_name,
            Self::QmkInfo => &export.qmk_info_file_name,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zmk" => Ok(Self::Zmk),
            "qmk" => Ok(Self::Qmk),
            "qmk-info" | "qmk_info" => Ok(Self::QmkInfo),
            other => Err(format!(
                "unknown output format '{other}' (expected zmk, qmk or qmk-info)"
            )),
        }
    }
}

/// Service for managing layout file I/O operations.
///
/// This service centralizes all layout file operations to ensure consistent
/// handling of file paths, error messages, and file system operations.
pub struct LayoutService;

impl LayoutService {
    /// Resolves the input format: the explicit one if given, else the file extension.
    pub fn detect_format(path: &Path, explicit: Option<LayoutFormat>) -> Result<LayoutFormat> {
        explicit
            .or_else(|| LayoutFormat::from_path(path))
            .with_context(|| {
                format!(
                    "Cannot determine layout format of {}; pass --from kle or --from zmk",
                    path.display()
                )
            })
    }

    /// Loads the keys of a layout file.
    ///
    /// # Returns
    ///
    /// * `Ok(keys)` - Successfully parsed layout
    /// * `Err(...)` - I/O error, or an [`ImportError`] in the error chain for malformed input
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use lazylayout::services::{LayoutFormat, LayoutService};
    ///
    /// let keys = LayoutService::load(Path::new("corne.json"), LayoutFormat::Kle)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &Path, format: LayoutFormat) -> Result<Vec<KeyLayout>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout file: {}", path.display()))?;

        let keys = format
            .import(&content)
            .with_context(|| format!("Failed to import {format} layout from {}", path.display()))?;

        info!(path = %path.display(), %format, keys = keys.len(), "Loaded layout");
        Ok(keys)
    }

    /// Loads a layout file into a fresh document configured by `config`.
    pub fn load_document(
        path: &Path,
        format: LayoutFormat,
        config: &Config,
    ) -> Result<LayoutDocument> {
        let keys = Self::load(path, format)?;
        let mut document = config.new_document();
        document.set_keys(keys);
        Ok(document)
    }

    /// Renders a document in `format`, using the document's unit pitch.
    pub fn render(
        document: &LayoutDocument,
        format: ExportFormat,
        export_config: &ExportConfig,
    ) -> Result<String> {
        let keys = document.keys();
        let content = match format {
            ExportFormat::Zmk => {
                let options = ZmkExportOptions::default()
                    .with_unit_pitch(document.unit_pitch_mm())
                    .with_node_name(export_config.layout_node_name.clone())
                    .with_display_name(export_config.layout_display_name.clone());
                export::export_zmk_with(keys, &options)
            }
            ExportFormat::Qmk => {
                let mut json = export::export_qmk(keys)
                    .to_json_pretty()
                    .context("Failed to serialize QMK keymap")?;
                json.push('\n');
                json
            }
            ExportFormat::QmkInfo => {
                let mut json = export::export_qmk_info(keys, &export_config.qmk_layout_name)
                    .to_json_pretty()
                    .context("Failed to serialize QMK info.json layout")?;
                json.push('\n');
                json
            }
        };

        debug!(%format, keys = keys.len(), bytes = content.len(), "Rendered layout");
        Ok(content)
    }

    /// Writes rendered output to a file.
    ///
    /// This performs an atomic write using a temp file + rename pattern to ensure
    /// the file is never left in a corrupted state.
    pub fn save(content: &str, path: &Path) -> Result<()> {
        let temp_path = temp_path_for(path);

        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

        if let Err(err) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err)
                .with_context(|| format!("Failed to write output file: {}", path.display()));
        }

        info!(path = %path.display(), bytes = content.len(), "Saved layout");
        Ok(())
    }
}

/// Sibling temp file used by [`LayoutService::save`].
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Returns true if `err` was caused by malformed layout input.
#[must_use]
pub fn is_import_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<ImportError>())
}
