//! Editing sessions against the document model: drags, bulk edits and undo/redo.

use lazylayout::config::Config;
use lazylayout::models::{KeyLayout, KeyPatch, LayoutDocument, Point, UpdateOptions};
use lazylayout::services::geometry::{
    bounding_box, drag_patch, select_in_marquee, CanvasMetrics, Rect, BASE_UNIT_PX,
};

fn two_keys() -> LayoutDocument {
    LayoutDocument::from_keys(vec![
        KeyLayout::new(0.0, 0.0).with_primary_label("A"),
        KeyLayout::new(3.0, 0.0)
            .with_rotation(0.0, Point::new(3.0, 0.0))
            .with_primary_label("B"),
    ])
}

fn assert_key_at(document: &LayoutDocument, index: usize, x: f64, y: f64) {
    let key = &document.keys()[index];
    assert!(
        (key.x - x).abs() < 1e-9 && (key.y - y).abs() < 1e-9,
        "key {index}: expected ({x}, {y}), got ({}, {})",
        key.x,
        key.y
    );
}

#[test]
fn test_drag_session_is_one_undo_step() {
    let config = Config::new();
    let unit_px = config.unit_px();
    let threshold = config.snap_threshold();
    let mut document = two_keys();
    let id = document.keys()[1].id;
    assert!(!document.can_undo());

    let before = document.snapshot();
    // Intermediate pointer positions, none near another key
    for pivot_px in [Point::new(170.0, 40.0), Point::new(120.0, 30.0)] {
        let current = document.key(id).unwrap().clone();
        let patch = drag_patch(
            &current,
            document.keys(),
            pivot_px,
            unit_px,
            threshold,
        );
        assert!(document.update_key(id, &patch, UpdateOptions::transient()));
    }
    assert!(!document.can_undo());

    // Final position lands 2px right and 3px below A's top-right corner
    let current = document.key(id).unwrap().clone();
    let patch = drag_patch(
        &current,
        document.keys(),
        Point::new(62.0, 3.0),
        unit_px,
        threshold,
    );
    document.update_key(id, &patch, UpdateOptions::transient());
    document.commit_history(before);

    assert_key_at(&document, 1, 1.0, 0.0);
    assert_eq!(document.history().undo_depth(), 1);

    assert!(document.undo());
    assert_key_at(&document, 1, 3.0, 0.0);
    assert!(document.can_redo());

    assert!(document.redo());
    assert_key_at(&document, 1, 1.0, 0.0);
    assert!(!document.can_redo());
}

#[test]
fn test_configured_snap_threshold_disables_snapping() {
    let mut config = Config::new();
    config.editor.snap_threshold_px = 0.0;
    let document = two_keys();
    let current = document.keys()[1].clone();

    let patch = drag_patch(
        &current,
        document.keys(),
        Point::new(62.0, 3.0),
        config.unit_px(),
        config.snap_threshold(),
    );
    let moved = current.patched(&patch);
    assert!((moved.x - 62.0 / 60.0).abs() < 1e-9);
    assert!((moved.y - 3.0 / 60.0).abs() < 1e-9);
}

#[test]
fn test_bulk_edits_and_undo_chain() {
    let mut document = two_keys();
    let ids: Vec<_> = document.keys().iter().map(|key| key.id).collect();
    document.set_selected_keys(ids.clone());

    assert!(document.nudge_selected(0.5, 0.25));
    assert!(document.rotate_selected(-90.0));
    assert_eq!(document.keys()[0].rotation_angle, 270.0);

    let copies = document.duplicate_selected();
    assert_eq!(copies.len(), 2);
    assert_eq!(document.len(), 4);
    assert_eq!(document.selection(), copies.as_slice());

    assert!(document.delete_selected());
    assert_eq!(document.len(), 2);
    assert!(document.selection().is_empty());

    // delete, duplicate, rotate, nudge
    for _ in 0..4 {
        assert!(document.undo());
    }
    assert!(!document.undo());
    assert_key_at(&document, 0, 0.0, 0.0);
    assert_key_at(&document, 1, 3.0, 0.0);
    assert_eq!(document.keys()[0].rotation_angle, 0.0);
}

#[test]
fn test_new_edit_discards_redo() {
    let mut document = two_keys();
    let id = document.keys()[0].id;

    document.update_key(
        id,
        &KeyPatch::new().with_position(5.0, 5.0),
        UpdateOptions::default(),
    );
    assert!(document.undo());
    assert!(document.can_redo());

    document.update_key(
        id,
        &KeyPatch::new().with_size(2.0, 1.0),
        UpdateOptions::default(),
    );
    assert!(!document.can_redo());
    assert_eq!(document.keys()[0].w, 2.0);
    assert_key_at(&document, 0, 0.0, 0.0);
}

#[test]
fn test_marquee_selection_on_canvas() {
    let mut document = two_keys();
    let unit_px = document.unit_px(BASE_UNIT_PX);
    let canvas = bounding_box(document.keys(), unit_px, &CanvasMetrics::default());

    // Covers only the first key on the padded canvas
    let rect = Rect::new(canvas.offset_x - 5.0, canvas.offset_y - 5.0, 30.0, 30.0);
    assert!(select_in_marquee(&mut document, &rect, unit_px, canvas.offset()));
    assert_eq!(document.selection(), &[document.keys()[0].id]);

    // A click-sized marquee leaves the selection alone
    let click = Rect::new(canvas.offset_x + 190.0, canvas.offset_y + 10.0, 2.0, 2.0);
    assert!(!select_in_marquee(&mut document, &click, unit_px, canvas.offset()));
    assert_eq!(document.selection().len(), 1);
}

#[test]
fn test_configured_history_limit() {
    let mut config = Config::new();
    config.editor.history_limit = Some(2);
    let mut document = config.new_document();
    document.set_keys(vec![KeyLayout::new(0.0, 0.0)]);
    let id = document.keys()[0].id;
    document.select_key(id);

    for _ in 0..5 {
        document.nudge_selected(1.0, 0.0);
    }
    assert_key_at(&document, 0, 5.0, 0.0);

    assert!(document.undo());
    assert!(document.undo());
    assert!(!document.undo());
    assert_key_at(&document, 0, 3.0, 0.0);
}
