//! Export of layouts to firmware formats.
//!
//! Exporters are pure functions from a key sequence to text or a serializable
//! value; writing the result to disk is the caller's concern.

pub mod qmk;
pub mod zmk;

pub use qmk::{export_qmk, export_qmk_info, QmkInfoLayout, QmkKeyPosition, QmkKeymap};
pub use zmk::{export_zmk, export_zmk_with, ZmkExportOptions};
