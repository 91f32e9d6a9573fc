//! ZMK devicetree export.
//!
//! Produces a `.keymap`-style document with three nodes: the physical layout
//! (one `&key_physical_attrs` tuple per key), a position map listing the key
//! positions in order, and a keymap whose `default_layer` binds every key.
//!
//! # Fixed-Point Columns
//!
//! Every attrs field is written as hundredths (`1.5u` → `150`), rounded half
//! toward +∞ and right-justified to a fixed column width so the tuples line up
//! under the header comment. Negative values are wrapped in parentheses
//! (`(-25)`), which may overflow the column but are never truncated.

#![allow(clippy::cast_possible_truncation)]

use std::fmt::Write as _;

use crate::models::{KeyLayout, DEFAULT_PITCH_MM};

/// Column widths for `w h x y rot rx ry`.
pub const FIELD_WIDTHS: [usize; 7] = [3, 3, 4, 4, 7, 5, 5];

/// Default devicetree node name of the physical layout.
pub const DEFAULT_NODE_NAME: &str = "imported_layout";

/// Default `display-name` of the physical layout.
pub const DEFAULT_DISPLAY_NAME: &str = "Imported Layout";

const INCLUDES: [&str; 4] = [
    "#include <behaviors.dtsi>",
    "#include <dt-bindings/zmk/keys.h>",
    "#include <dt-bindings/zmk/matrix_transform.h>",
    "#include <physical_layouts.dtsi>",
];

const KEYS_HEADER: &str =
    "        keys  //                     w   h    x    y     rot    rx    ry";
const ENTRY_INDENT: &str = "            ";

/// Options for [`export_zmk_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct ZmkExportOptions {
    /// Physical size of one unit; positions and sizes are scaled by
    /// `unit_pitch_mm / 19.05`
    pub unit_pitch_mm: f64,
    /// Devicetree node name (and label) of the physical layout
    pub node_name: String,
    /// Human-readable layout name
    pub display_name: String,
}

impl Default for ZmkExportOptions {
    fn default() -> Self {
        Self {
            unit_pitch_mm: DEFAULT_PITCH_MM,
            node_name: DEFAULT_NODE_NAME.to_string(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }
}

impl ZmkExportOptions {
    /// Sets the unit pitch.
    #[must_use]
    pub fn with_unit_pitch(mut self, unit_pitch_mm: f64) -> Self {
        self.unit_pitch_mm = unit_pitch_mm;
        self
    }

    /// Sets the node name.
    #[must_use]
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Multiplier applied to positions, sizes and pivots.
    ///
    /// Non-finite or non-positive pitches fall back to 1.
    #[must_use]
    pub fn pitch_scale(&self) -> f64 {
        if self.unit_pitch_mm.is_finite() && self.unit_pitch_mm > 0.0 {
            self.unit_pitch_mm / DEFAULT_PITCH_MM
        } else {
            1.0
        }
    }
}

/// Exports `keys` with the default node names.
#[must_use]
pub fn export_zmk(keys: &[KeyLayout], unit_pitch_mm: f64) -> String {
    export_zmk_with(keys, &ZmkExportOptions::default().with_unit_pitch(unit_pitch_mm))
}

/// Exports `keys` as ZMK devicetree text.
#[must_use]
pub fn export_zmk_with(keys: &[KeyLayout], options: &ZmkExportOptions) -> String {
    let node = &options.node_name;
    let mut out = String::new();

    for include in INCLUDES {
        out.push_str(include);
        out.push('\n');
    }
    out.push_str("\n/ {\n");

    // Physical layout
    let _ = writeln!(out, "    {node}: {node} {{");
    out.push_str("        compatible = \"zmk,physical-layout\";\n");
    let _ = writeln!(
        out,
        "        display-name = \"{}\";",
        escape_string(&options.display_name)
    );
    out.push_str(KEYS_HEADER);
    out.push('\n');
    if keys.is_empty() {
        let _ = writeln!(out, "{ENTRY_INDENT}= <>;");
    } else {
        let scale = options.pitch_scale();
        for (index, key) in keys.iter().enumerate() {
            let separator = if index == 0 { '=' } else { ',' };
            let _ = writeln!(
                out,
                "{ENTRY_INDENT}{separator} {}",
                physical_attrs(key, scale)
            );
        }
        let _ = writeln!(out, "{ENTRY_INDENT};");
    }
    out.push_str("    };\n\n");

    // Position map
    let positions: Vec<String> = (0..keys.len()).map(|index| index.to_string()).collect();
    out.push_str("    position_map {\n");
    out.push_str("        compatible = \"zmk,physical-layout-position-map\";\n");
    out.push_str("        complete;\n\n");
    let _ = writeln!(out, "        {node}_positions {{");
    let _ = writeln!(out, "            physical-layout = <&{node}>;");
    let _ = writeln!(out, "            positions = <{}>;", positions.join(" "));
    out.push_str("        };\n");
    out.push_str("    };\n\n");

    // Keymap
    out.push_str("    keymap {\n");
    out.push_str("        compatible = \"zmk,keymap\";\n\n");
    out.push_str("        default_layer {\n");
    out.push_str("            bindings = <\n");
    for key in keys {
        let _ = writeln!(out, "                {}", key.effective_binding());
    }
    out.push_str("            >;\n");
    out.push_str("        };\n");
    out.push_str("    };\n");
    out.push_str("};\n");

    out
}

/// One `<&key_physical_attrs ...>` tuple.
fn physical_attrs(key: &KeyLayout, scale: f64) -> String {
    let values = [
        key.w * scale,
        key.h * scale,
        key.x * scale,
        key.y * scale,
        key.rotation_angle,
        key.rotation_center.x * scale,
        key.rotation_center.y * scale,
    ];
    let fields: Vec<String> = values
        .iter()
        .zip(FIELD_WIDTHS)
        .map(|(&value, width)| format_field(value, width))
        .collect();
    format!("<&key_physical_attrs {}>", fields.join(" "))
}

/// Value × 100, rounded half toward +∞.
#[must_use]
pub fn fixed_point(value: f64) -> i64 {
    (value * 100.0 + 0.5).floor() as i64
}

/// Renders one fixed-point field right-justified to `width`.
#[must_use]
pub fn format_field(value: f64, width: usize) -> String {
    let scaled = fixed_point(value);
    if scaled < 0 {
        format!("{:>width$}", format!("(-{})", scaled.unsigned_abs()))
    } else {
        format!("{scaled:>width$}")
    }
}

fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
