//! QMK JSON export.
//!
//! Two one-directional outputs:
//!
//! - [`export_qmk`]: a flat keymap (`{"layout": "CUSTOM", "keymap": [...]}`)
//!   listing each key's primary legend in document order
//! - [`export_qmk_info`]: an `info.json` `layouts` fragment describing the
//!   physical position of every key

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::export::zmk::fixed_point;
use crate::models::KeyLayout;

/// Layout name written by [`export_qmk`].
pub const CUSTOM_LAYOUT: &str = "CUSTOM";

/// Keycode written for keys without a primary legend.
pub const EMPTY_KEYCODE: &str = "KC_NO";

/// Flat QMK keymap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QmkKeymap {
    /// Always `"CUSTOM"`
    pub layout: String,
    /// One keycode per key, in document order
    pub keymap: Vec<String>,
}

impl QmkKeymap {
    /// Serializes as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds the flat keymap for `keys`.
#[must_use]
pub fn export_qmk(keys: &[KeyLayout]) -> QmkKeymap {
    QmkKeymap {
        layout: CUSTOM_LAYOUT.to_string(),
        keymap: keys
            .iter()
            .map(|key| match key.primary_label() {
                "" => EMPTY_KEYCODE.to_string(),
                label => label.to_string(),
            })
            .collect(),
    }
}

/// `info.json` fragment: `{"layouts": {"<name>": {"layout": [...]}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmkInfoLayout {
    /// Layout definitions by name
    pub layouts: BTreeMap<String, QmkLayoutDefinition>,
}

impl QmkInfoLayout {
    /// Serializes as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One named layout in `info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmkLayoutDefinition {
    /// Physical key positions in document order
    pub layout: Vec<QmkKeyPosition>,
}

/// Physical position of one key, in keyboard units.
///
/// Size and rotation fields are omitted when they hold QMK's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmkKeyPosition {
    /// Primary legend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// X position in keyboard units
    pub x: f64,
    /// Y position in keyboard units
    pub y: f64,
    /// Key width in keyboard units (default 1.0)
    #[serde(default = "default_key_size", skip_serializing_if = "is_default_key_size")]
    pub w: f64,
    /// Key height in keyboard units (default 1.0)
    #[serde(default = "default_key_size", skip_serializing_if = "is_default_key_size")]
    pub h: f64,
    /// Rotation in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    /// Rotation origin x
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx: Option<f64>,
    /// Rotation origin y
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ry: Option<f64>,
}

fn default_key_size() -> f64 {
    1.0
}

#[allow(clippy::trivially_copy_pass_by_ref, clippy::float_cmp)]
fn is_default_key_size(size: &f64) -> bool {
    *size == 1.0
}

impl From<&KeyLayout> for QmkKeyPosition {
    fn from(key: &KeyLayout) -> Self {
        let rotated = key.is_rotated();
        Self {
            label: Some(key.primary_label())
                .filter(|label| !label.is_empty())
                .map(str::to_string),
            x: hundredths(key.x),
            y: hundredths(key.y),
            w: hundredths(key.w),
            h: hundredths(key.h),
            r: rotated.then(|| hundredths(key.rotation_angle)),
            rx: rotated.then(|| hundredths(key.rotation_center.x)),
            ry: rotated.then(|| hundredths(key.rotation_center.y)),
        }
    }
}

/// Builds an `info.json` layout named `layout_name` from `keys`.
#[must_use]
pub fn export_qmk_info(keys: &[KeyLayout], layout_name: &str) -> QmkInfoLayout {
    let definition = QmkLayoutDefinition {
        layout: keys.iter().map(QmkKeyPosition::from).collect(),
    };
    QmkInfoLayout {
        layouts: BTreeMap::from([(layout_name.to_string(), definition)]),
    }
}

/// Rounds to two decimals the same way the ZMK columns do.
fn hundredths(value: f64) -> f64 {
    fixed_point(value) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use serde_json::json;

    #[test]
    fn test_export_qmk_legends() {
        let keys = vec![
            KeyLayout::new(0.0, 0.0).with_primary_label("KC_A"),
            KeyLayout::new(1.0, 0.0),
        ];
        let keymap = export_qmk(&keys);
        assert_eq!(keymap.layout, "CUSTOM");
        assert_eq!(keymap.keymap, vec!["KC_A", "KC_NO"]);
    }

    #[test]
    fn test_export_qmk_json_shape() {
        let keymap = export_qmk(&[KeyLayout::new(0.0, 0.0)]);
        let value: serde_json::Value =
            serde_json::from_str(&keymap.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value, json!({"layout": "CUSTOM", "keymap": ["KC_NO"]}));
    }

    #[test]
    fn test_export_qmk_empty() {
        assert!(export_qmk(&[]).keymap.is_empty());
    }

    #[test]
    fn test_info_omits_defaults() {
        let info = export_qmk_info(&[KeyLayout::new(2.0, 1.0)], "LAYOUT");
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value, json!({"layouts": {"LAYOUT": {"layout": [{"x": 2.0, "y": 1.0}]}}}));
    }

    #[test]
    fn test_info_rotated_key() {
        let key = KeyLayout::new(0.333, 1.0)
            .with_size(1.5, 1.0)
            .with_rotation(15.0, Point::new(3.0, 2.5))
            .with_primary_label("Space");
        let info = export_qmk_info(&[key], "LAYOUT_split");
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value["layouts"]["LAYOUT_split"]["layout"][0],
            json!({"label": "Space", "x": 0.33, "y": 1.0, "w": 1.5, "r": 15.0, "rx": 3.0, "ry": 2.5})
        );
    }

    #[test]
    fn test_info_deserializes_with_defaults() {
        let position: QmkKeyPosition = serde_json::from_str(r#"{"x": 1, "y": 2}"#).unwrap();
        assert_eq!(position.w, 1.0);
        assert_eq!(position.h, 1.0);
        assert!(position.r.is_none());
        assert!(position.label.is_none());
    }
}
