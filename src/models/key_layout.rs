//! Physical key definition: position, size, rotation and legends.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::Point;

/// Number of legend slots on a key (3×3 grid).
pub const LABEL_COUNT: usize = 9;

/// Index of the primary (center) legend in the 3×3 grid.
pub const PRIMARY_LABEL_INDEX: usize = 4;

/// Binding behavior used when a binding is derived from a legend.
pub const KEY_PRESS_BEHAVIOR: &str = "&kp";

/// Keycode used in a derived binding when the primary legend is empty.
pub const EMPTY_BINDING_KEYCODE: &str = "NO";

/// Legend grid, row-major: top row, middle row, bottom row.
pub type Labels = [String; LABEL_COUNT];

/// Opaque, never-reused identifier of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(Uuid);

impl KeyId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Builds a full legend grid from any number of legends.
///
/// Missing slots are filled with empty strings and entries beyond the ninth
/// are dropped.
pub fn labels_from_slice<S: AsRef<str>>(labels: &[S]) -> Labels {
    std::array::from_fn(|index| {
        labels
            .get(index)
            .map(|label| label.as_ref().to_string())
            .unwrap_or_default()
    })
}

/// Builds a legend grid with only the primary (center) legend set.
pub fn primary_labels(label: impl Into<String>) -> Labels {
    let mut labels = Labels::default();
    labels[PRIMARY_LABEL_INDEX] = label.into();
    labels
}

/// Derives the binding for a primary legend (`&kp A`, or `&kp NO` when empty).
#[must_use]
pub fn default_binding(primary_label: &str) -> String {
    let keycode = if primary_label.is_empty() {
        EMPTY_BINDING_KEYCODE
    } else {
        primary_label
    };
    format!("{KEY_PRESS_BEHAVIOR} {keycode}")
}

/// Normalizes an angle in degrees into `[0, 360)`.
///
/// Non-finite input normalizes to 0.
#[must_use]
pub fn normalize_angle(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// One physical key of a layout.
///
/// # Coordinates
///
/// - `x`, `y`, `w`, `h` and `rotation_center` are in keyboard units
///   (1u = one standard keycap pitch)
/// - The key rotates by `rotation_angle` degrees (clockwise) about
///   `rotation_center`, which need not coincide with the key's corner
///
/// # Deserialization
///
/// JSON input may carry a `labels` array of any length and/or a legacy
/// single `label` string; both are folded into the 9-slot grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "KeyLayoutRecord")]
pub struct KeyLayout {
    /// Stable identifier
    pub id: KeyId,
    /// Left edge in units (before rotation)
    pub x: f64,
    /// Top edge in units (before rotation)
    pub y: f64,
    /// Width in units
    pub w: f64,
    /// Height in units
    pub h: f64,
    /// Rotation in degrees, clockwise
    pub rotation_angle: f64,
    /// Pivot the key rotates about, in units
    pub rotation_center: Point,
    /// 3×3 legend grid
    pub labels: Labels,
    /// Semantic action (e.g. `&kp A`)
    pub binding: Option<String>,
}

impl KeyLayout {
    /// Creates a 1×1 unrotated key at the given unit position with a fresh id.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: KeyId::new(),
            x,
            y,
            w: 1.0,
            h: 1.0,
            rotation_angle: 0.0,
            rotation_center: Point::default(),
            labels: Labels::default(),
            binding: None,
        }
    }

    /// Sets the key size.
    #[must_use]
    pub fn with_size(mut self, w: f64, h: f64) -> Self {
        self.w = w;
        self.h = h;
        self
    }

    /// Sets the rotation angle and pivot.
    #[must_use]
    pub fn with_rotation(mut self, angle: f64, center: Point) -> Self {
        self.rotation_angle = normalize_angle(angle);
        self.rotation_center = center;
        self
    }

    /// Sets the full legend grid.
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the primary legend and derives the binding from it.
    #[must_use]
    pub fn with_primary_label(mut self, label: impl Into<String>) -> Self {
        self.labels[PRIMARY_LABEL_INDEX] = label.into();
        self.binding = Some(default_binding(self.primary_label()));
        self
    }

    /// Sets an explicit binding.
    #[must_use]
    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    /// The center legend.
    #[must_use]
    pub fn primary_label(&self) -> &str {
        &self.labels[PRIMARY_LABEL_INDEX]
    }

    /// The key's binding, or the one derived from its primary legend.
    #[must_use]
    pub fn effective_binding(&self) -> String {
        match self.binding.as_deref() {
            Some(binding) if !binding.trim().is_empty() => binding.to_string(),
            _ => default_binding(self.primary_label()),
        }
    }

    /// Returns true if the key is rotated.
    #[must_use]
    pub fn is_rotated(&self) -> bool {
        self.rotation_angle != 0.0
    }

    /// Translates the key and its pivot by `(dx, dy)` units.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.rotation_center = self.rotation_center.translated(dx, dy);
    }

    /// Returns a copy of this key with `patch` merged in.
    ///
    /// Non-finite numbers in the patch are ignored. A patched legend grid
    /// whose primary legend changed regenerates the binding, unless the
    /// patch also carries one.
    #[must_use]
    pub fn patched(&self, patch: &KeyPatch) -> Self {
        let mut next = self.clone();

        if let Some(x) = finite(patch.x) {
            next.x = x;
        }
        if let Some(y) = finite(patch.y) {
            next.y = y;
        }
        if let Some(w) = finite(patch.w) {
            next.w = w;
        }
        if let Some(h) = finite(patch.h) {
            next.h = h;
        }
        if let Some(angle) = finite(patch.rotation_angle) {
            next.rotation_angle = normalize_angle(angle);
        }
        if let Some(cx) = finite(patch.rotation_center.x) {
            next.rotation_center.x = cx;
        }
        if let Some(cy) = finite(patch.rotation_center.y) {
            next.rotation_center.y = cy;
        }

        if let Some(labels) = &patch.labels {
            next.labels = labels_from_slice(labels);
            if patch.binding.is_none() && next.primary_label() != self.primary_label() {
                next.binding = Some(default_binding(next.primary_label()));
            }
        }
        if let Some(binding) = &patch.binding {
            next.binding = Some(binding.clone());
        }

        next
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Partial update of a pivot; each coordinate merges independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointPatch {
    /// New pivot x, if any
    pub x: Option<f64>,
    /// New pivot y, if any
    pub y: Option<f64>,
}

/// Partial update of a key, applied with [`KeyLayout::patched`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyPatch {
    /// New left edge
    pub x: Option<f64>,
    /// New top edge
    pub y: Option<f64>,
    /// New width
    pub w: Option<f64>,
    /// New height
    pub h: Option<f64>,
    /// New rotation angle in degrees
    pub rotation_angle: Option<f64>,
    /// Field-by-field pivot update
    pub rotation_center: PointPatch,
    /// Replacement legend grid (normalized to 9 slots)
    pub labels: Option<Vec<String>>,
    /// Explicit binding
    pub binding: Option<String>,
}

impl KeyPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn with_size(mut self, w: f64, h: f64) -> Self {
        self.w = Some(w);
        self.h = Some(h);
        self
    }

    /// Sets the rotation angle.
    #[must_use]
    pub fn with_rotation_angle(mut self, angle: f64) -> Self {
        self.rotation_angle = Some(angle);
        self
    }

    /// Sets both pivot coordinates.
    #[must_use]
    pub fn with_rotation_center(mut self, center: Point) -> Self {
        self.rotation_center = PointPatch {
            x: Some(center.x),
            y: Some(center.y),
        };
        self
    }

    /// Sets only the pivot x coordinate.
    #[must_use]
    pub fn with_rotation_center_x(mut self, x: f64) -> Self {
        self.rotation_center.x = Some(x);
        self
    }

    /// Sets only the pivot y coordinate.
    #[must_use]
    pub fn with_rotation_center_y(mut self, y: f64) -> Self {
        self.rotation_center.y = Some(y);
        self
    }

    /// Replaces the legend grid.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Sets an explicit binding.
    #[must_use]
    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }
}

/// Wire shape accepted when deserializing a [`KeyLayout`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyLayoutRecord {
    #[serde(default)]
    id: Option<KeyId>,
    x: f64,
    y: f64,
    #[serde(default = "default_key_size")]
    w: f64,
    #[serde(default = "default_key_size")]
    h: f64,
    #[serde(default)]
    rotation_angle: f64,
    #[serde(default)]
    rotation_center: Point,
    #[serde(default)]
    labels: Option<Vec<String>>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    binding: Option<String>,
}

fn default_key_size() -> f64 {
    1.0
}

impl From<KeyLayoutRecord> for KeyLayout {
    fn from(record: KeyLayoutRecord) -> Self {
        let labels = match (record.labels, record.label) {
            (Some(labels), _) => labels_from_slice(&labels),
            (None, Some(label)) => primary_labels(label),
            (None, None) => Labels::default(),
        };

        Self {
            id: record.id.unwrap_or_default(),
            x: record.x,
            y: record.y,
            w: record.w,
            h: record.h,
            rotation_angle: normalize_angle(record.rotation_angle),
            rotation_center: record.rotation_center,
            labels,
            binding: record.binding,
        }
    }
}
