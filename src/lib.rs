//! LazyLayout Library
//!
//! This library provides the core of the LazyLayout tool: the keyboard layout
//! document model with undo/redo history, the geometry kernel used for
//! rendering and hit testing, importers for KLE JSON and ZMK devicetree
//! layouts, and exporters for ZMK and QMK.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod export;
pub mod models;
pub mod parser;
pub mod services;
