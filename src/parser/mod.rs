//! Import of layouts from interchange formats.
//!
//! Importers take already-loaded text or JSON and return a complete key
//! sequence or an [`ImportError`]; they never hand back partial results.

pub mod error;
pub mod kle;
pub mod zmk;

// Re-export commonly used functions
pub use error::ImportError;
pub use kle::{import_kle, import_kle_str};
pub use zmk::import_zmk;
