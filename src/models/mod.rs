//! Data models for keyboard geometry documents.
//!
//! This module contains the key definition, the editable document and its
//! undo history. Models are independent of file formats and rendering.

pub mod document;
pub mod history;
pub mod key_layout;
pub mod point;

// Re-export all model types
pub use document::{
    Annotation, LayoutDocument, UpdateOptions, ViewMode, ANNOTATION_LABEL_INDEX, DEFAULT_PITCH_MM,
    DUPLICATE_OFFSET,
};
pub use history::{History, Snapshot};
pub use key_layout::{
    default_binding, labels_from_slice, normalize_angle, primary_labels, KeyId, KeyLayout,
    KeyPatch, Labels, PointPatch, KEY_PRESS_BEHAVIOR, LABEL_COUNT, PRIMARY_LABEL_INDEX,
};
pub use point::Point;
