//! Inspect command: summarize a layout file's geometry.

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::models::LayoutDocument;
use crate::services::geometry::{self, CanvasBounds, CanvasMetrics, Rect};
use crate::services::{LayoutFormat, LayoutService};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Show key count, extents and legends of a layout file
#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Layout file to read (KLE JSON or ZMK devicetree)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Input format: kle or zmk (detected from the file extension if omitted)
    #[arg(long, value_name = "FORMAT")]
    pub from: Option<LayoutFormat>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One key in an [`InspectReport`].
#[derive(Debug, Clone, Serialize)]
pub struct KeySummary {
    /// Position in document order
    pub index: usize,
    /// Primary legend
    pub legend: String,
    /// Binding (explicit or derived)
    pub binding: String,
    /// Left edge in units
    pub x: f64,
    /// Top edge in units
    pub y: f64,
    /// Width in units
    pub w: f64,
    /// Height in units
    pub h: f64,
    /// Rotation in degrees
    pub rotation_angle: f64,
}

/// Geometry summary printed by `inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    /// Inspected file
    pub file: String,
    /// Format the file was read as
    pub format: LayoutFormat,
    /// Number of keys
    pub key_count: usize,
    /// Number of keys with a non-zero rotation
    pub rotated_key_count: usize,
    /// Unit pitch used for the canvas
    pub unit_pitch_mm: f64,
    /// Unit-space rectangle enclosing every rotated corner (absent for no keys)
    pub extents: Option<Rect>,
    /// Canvas needed to display the layout
    pub canvas: CanvasBounds,
    /// Per-key details
    pub keys: Vec<KeySummary>,
}

impl InspectReport {
    /// Summarizes `document` as loaded from `path`.
    #[must_use]
    pub fn build(
        path: &Path,
        format: LayoutFormat,
        document: &LayoutDocument,
        config: &Config,
    ) -> Self {
        let keys = document.keys();
        let unit_px = document.unit_px(config.editor.base_unit_px);

        Self {
            file: path.display().to_string(),
            format,
            key_count: keys.len(),
            rotated_key_count: keys.iter().filter(|key| key.is_rotated()).count(),
            unit_pitch_mm: document.unit_pitch_mm(),
            extents: geometry::extents(keys),
            canvas: geometry::bounding_box(keys, unit_px, &CanvasMetrics::default()),
            keys: keys
                .iter()
                .enumerate()
                .map(|(index, key)| KeySummary {
                    index,
                    legend: key.primary_label().to_string(),
                    binding: key.effective_binding(),
                    x: key.x,
                    y: key.y,
                    w: key.w,
                    h: key.h,
                    rotation_angle: key.rotation_angle,
                })
                .collect(),
        }
    }

    /// Human-readable rendering.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("Layout: {} ({})", self.file, self.format),
            format!("Keys: {} ({} rotated)", self.key_count, self.rotated_key_count),
        ];

        match &self.extents {
            Some(rect) => lines.push(format!(
                "Extents: ({:.2}, {:.2}) to ({:.2}, {:.2}) units, {:.2} × {:.2}",
                rect.x,
                rect.y,
                rect.right(),
                rect.bottom(),
                rect.width,
                rect.height
            )),
            None => lines.push("Extents: none".to_string()),
        }
        lines.push(format!(
            "Canvas: {:.0} × {:.0} px at {} mm pitch",
            self.canvas.width, self.canvas.height, self.unit_pitch_mm
        ));

        if !self.keys.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "{:>4}  {:<12} {:>7} {:>7} {:>6} {:>6} {:>7}",
                "#", "legend", "x", "y", "w", "h", "rot"
            ));
            for key in &self.keys {
                lines.push(format!(
                    "{:>4}  {:<12} {:>7.2} {:>7.2} {:>6.2} {:>6.2} {:>7.2}",
                    key.index, key.legend, key.x, key.y, key.w, key.h, key.rotation_angle
                ));
            }
        }

        lines.join("\n")
    }
}

impl InspectArgs {
    /// Execute the inspect command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let format = LayoutService::detect_format(&self.input, self.from)
            .map_err(|e| CliError::validation(format!("{e:#}")))?;

        let document = LayoutService::load_document(&self.input, format, config)
            .map_err(CliError::from_layout_error)?;

        let report = InspectReport::build(&self.input, format, &document, config);

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::io(format!("Failed to serialize report: {e}")))?;
            println!("{json}");
        } else {
            println!("{}", report.to_text());
        }

        Ok(())
    }
}
