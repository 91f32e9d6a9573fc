//! CLI command handlers for LazyLayout.
//!
//! This module provides headless, scriptable access to the layout importers
//! and exporters for automation, testing, and CI/CD integration.

pub mod common;
pub mod config;
pub mod convert;
pub mod inspect;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use convert::ConvertArgs;
pub use inspect::InspectArgs;
