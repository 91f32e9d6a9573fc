//! Geometry kernel for rotated rectangular keys.
//!
//! Everything here is a pure function: no state, no mutation of its inputs.
//! Stored coordinates are always in keyboard units; functions that work in
//! screen space take an explicit `unit_px` (pixels per unit) so the screen
//! scale is never baked into a document.
//!
//! # Corner Order
//!
//! Corners are always produced as top-left, top-right, bottom-left,
//! bottom-right (of the unrotated key). Snapping and bounds iterate in this
//! order, which keeps their results deterministic.

use serde::Serialize;

use crate::models::{KeyId, KeyLayout, KeyPatch, LayoutDocument, Point, DEFAULT_PITCH_MM};

/// Pixels per unit at the default pitch.
pub const BASE_UNIT_PX: f64 = 60.0;

/// Maximum corner distance (pixels) at which a dragged key snaps.
pub const SNAP_THRESHOLD_PX: f64 = 10.0;

/// A marquee smaller than this in both dimensions is treated as a click.
pub const MARQUEE_MIN_SIZE_PX: f64 = 4.0;

/// Canvas sizing rules for [`bounding_box`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMetrics {
    /// Margin added on every side of the keys
    pub padding: f64,
    /// Smallest canvas width
    pub min_width: f64,
    /// Smallest canvas height
    pub min_height: f64,
    /// Largest canvas width (also the width of an empty canvas)
    pub max_width: f64,
    /// Largest canvas height (also the height of an empty canvas)
    pub max_height: f64,
}

impl Default for CanvasMetrics {
    fn default() -> Self {
        Self {
            padding: 120.0,
            min_width: 600.0,
            min_height: 400.0,
            max_width: 2000.0,
            max_height: 1200.0,
        }
    }
}

/// Canvas size plus the translation that brings all keys into view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasBounds {
    /// Canvas width in pixels
    pub width: f64,
    /// Canvas height in pixels
    pub height: f64,
    /// Horizontal translation applied to key coordinates
    pub offset_x: f64,
    /// Vertical translation applied to key coordinates
    pub offset_y: f64,
}

impl CanvasBounds {
    /// The translation as a point.
    #[must_use]
    pub const fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width (non-negative)
    pub width: f64,
    /// Height (non-negative)
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two opposite corners in any order (a marquee drag).
    #[must_use]
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }

    /// Smallest rectangle containing all `points`; `None` for no points.
    #[must_use]
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        Some(Self::from_points(min, max))
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Returns true if both dimensions are below `min_size`.
    #[must_use]
    pub fn is_click(&self, min_size: f64) -> bool {
        self.width < min_size && self.height < min_size
    }
}

/// Pixels per unit for a renderer drawing `base_unit_px` per unit at the default pitch.
///
/// Invalid pitches behave like the default pitch.
#[must_use]
pub fn unit_px_for_pitch(base_unit_px: f64, pitch_mm: f64) -> f64 {
    if pitch_mm.is_finite() && pitch_mm > 0.0 {
        base_unit_px * pitch_mm / DEFAULT_PITCH_MM
    } else {
        base_unit_px
    }
}

/// The key's four corners in unit space, rotated about its pivot.
#[must_use]
pub fn corner_points(key: &KeyLayout) -> [Point; 4] {
    let corners = [
        Point::new(key.x, key.y),
        Point::new(key.x + key.w, key.y),
        Point::new(key.x, key.y + key.h),
        Point::new(key.x + key.w, key.y + key.h),
    ];
    corners.map(|corner| corner.rotated_about(key.rotation_center, key.rotation_angle))
}

/// [`corner_points`] scaled to pixels.
#[must_use]
pub fn corner_points_px(key: &KeyLayout, unit_px: f64) -> [Point; 4] {
    corner_points(key).map(|corner| corner.scaled(unit_px))
}

/// Unit-space rectangle enclosing every rotated corner of `keys`.
#[must_use]
pub fn extents(keys: &[KeyLayout]) -> Option<Rect> {
    Rect::enclosing(keys.iter().flat_map(corner_points))
}

/// Canvas needed to show `keys` at `unit_px`, padded and clamped per `metrics`.
///
/// An empty layout gets the maximum canvas with the offset equal to the padding.
#[must_use]
pub fn bounding_box(keys: &[KeyLayout], unit_px: f64, metrics: &CanvasMetrics) -> CanvasBounds {
    let Some(area) = Rect::enclosing(keys.iter().flat_map(|key| corner_points_px(key, unit_px)))
    else {
        return CanvasBounds {
            width: metrics.max_width,
            height: metrics.max_height,
            offset_x: metrics.padding,
            offset_y: metrics.padding,
        };
    };

    let padded_width = area.width + metrics.padding * 2.0;
    let padded_height = area.height + metrics.padding * 2.0;

    CanvasBounds {
        width: padded_width.min(metrics.max_width).max(metrics.min_width),
        height: padded_height.min(metrics.max_height).max(metrics.min_height),
        offset_x: -area.x + metrics.padding,
        offset_y: -area.y + metrics.padding,
    }
}

/// Pixel rectangle enclosing the key's rotated corners, shifted by the canvas `offset`.
#[must_use]
pub fn key_bounding_rect(key: &KeyLayout, unit_px: f64, offset: Point) -> Rect {
    let corners = corner_points_px(key, unit_px).map(|c| c.translated(offset.x, offset.y));
    Rect::enclosing(corners).unwrap_or_default()
}

/// Axis-aligned overlap test; rectangles that only touch count as intersecting.
#[must_use]
pub fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    !(a.x > b.right() || a.right() < b.x || a.y > b.bottom() || a.bottom() < b.y)
}

/// Ids of the keys whose bounding rectangle intersects `rect`, in document order.
#[must_use]
pub fn keys_in_rect(keys: &[KeyLayout], rect: &Rect, unit_px: f64, offset: Point) -> Vec<KeyId> {
    keys.iter()
        .filter(|key| rects_intersect(rect, &key_bounding_rect(key, unit_px, offset)))
        .map(|key| key.id)
        .collect()
}

/// Replaces the document selection with the keys under a marquee.
///
/// Returns false, leaving the selection alone, when the marquee is click-sized.
pub fn select_in_marquee(
    document: &mut LayoutDocument,
    rect: &Rect,
    unit_px: f64,
    offset: Point,
) -> bool {
    if rect.is_click(MARQUEE_MIN_SIZE_PX) {
        return false;
    }
    let ids = keys_in_rect(document.keys(), rect, unit_px, offset);
    document.set_selected_keys(ids);
    true
}

/// Pixel offset that makes the closest corner pair between `moving` and any
/// other key coincide, if that pair is within `threshold_px`.
///
/// A key in `others` with the same id as `moving` is skipped. On equal
/// distances the first pair found wins.
#[must_use]
pub fn nearest_snap_offset(
    moving: &KeyLayout,
    others: &[KeyLayout],
    unit_px: f64,
    threshold_px: f64,
) -> Option<Point> {
    let moving_corners = corner_points_px(moving, unit_px);
    let mut best: Option<(Point, f64)> = None;

    for other in others.iter().filter(|other| other.id != moving.id) {
        let target_corners = corner_points_px(other, unit_px);
        for moving_corner in &moving_corners {
            for target_corner in &target_corners {
                let distance = moving_corner.distance_to(*target_corner);
                if distance > threshold_px {
                    continue;
                }
                if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                    best = Some((moving_corner.offset_to(*target_corner), distance));
                }
            }
        }
    }

    best.map(|(offset, _)| offset)
}

/// Plans a drag step: the key's pivot is dropped at `pivot_px` (canvas
/// pixels, offset already removed) and the key follows it, snapping to
/// nearby corners of `keys`.
///
/// The returned patch carries the new position and pivot. An invalid
/// `unit_px` yields an empty patch.
#[must_use]
pub fn drag_patch(
    current: &KeyLayout,
    keys: &[KeyLayout],
    pivot_px: Point,
    unit_px: f64,
    threshold_px: f64,
) -> KeyPatch {
    if !unit_px.is_finite() || unit_px <= 0.0 {
        return KeyPatch::new();
    }

    let place = |pivot_px: Point| {
        let pivot = Point::new(pivot_px.x / unit_px, pivot_px.y / unit_px);
        let delta = current.rotation_center.offset_to(pivot);
        let mut draft = current.clone();
        draft.x = current.x + delta.x;
        draft.y = current.y + delta.y;
        draft.rotation_center = pivot;
        draft
    };

    let mut draft = place(pivot_px);
    if let Some(snap) = nearest_snap_offset(&draft, keys, unit_px, threshold_px) {
        draft = place(pivot_px.translated(snap.x, snap.y));
    }

    KeyPatch::new()
        .with_position(draft.x, draft.y)
        .with_rotation_center(draft.rotation_center)
}
