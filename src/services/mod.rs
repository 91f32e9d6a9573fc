//! Service layer for business logic.
//!
//! This module contains the pure geometry kernel and the services that
//! coordinate file I/O with the importers and exporters.

pub mod geometry;
pub mod layouts;

// Re-export commonly used types and functions
pub use layouts::{ExportFormat, LayoutFormat, LayoutService};
