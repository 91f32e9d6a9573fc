//! Import failures shared by the KLE and ZMK readers.
//!
//! Every variant carries enough of the offending input (row/item position or
//! a text fragment) for the message to be shown to a user as-is. An import
//! either succeeds completely or returns one of these; there are no partial
//! results.

use thiserror::Error;

/// Longest fragment quoted in an error message.
const MAX_FRAGMENT_LEN: usize = 80;

/// Malformed-input failure from a layout import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The KLE document is not a JSON array of rows
    #[error("KLE layout must be a JSON array of rows")]
    KleNotArray,

    /// A KLE row is neither an array nor a metadata object
    #[error("KLE row {row} is not an array: {fragment}")]
    KleRowNotArray {
        /// Zero-based row index
        row: usize,
        /// Offending JSON
        fragment: String,
    },

    /// A KLE property that must be numeric is not
    #[error("KLE row {row}, item {item}: property `{field}` is not a number: {fragment}")]
    KleInvalidNumber {
        /// Zero-based row index
        row: usize,
        /// Zero-based item index within the row
        item: usize,
        /// Property name (`x`, `w`, `r`, ...)
        field: String,
        /// Offending JSON
        fragment: String,
    },

    /// A KLE `labels` property that is not an array
    #[error("KLE row {row}, item {item}: `labels` must be an array: {fragment}")]
    KleInvalidLabels {
        /// Zero-based row index
        row: usize,
        /// Zero-based item index within the row
        item: usize,
        /// Offending JSON
        fragment: String,
    },

    /// A KLE row item that is neither a legend string nor an object
    #[error("KLE row {row}, item {item} is neither a legend nor a property object: {fragment}")]
    KleInvalidToken {
        /// Zero-based row index
        row: usize,
        /// Zero-based item index within the row
        item: usize,
        /// Offending JSON
        fragment: String,
    },

    /// The KLE text is not valid JSON/JSON5
    #[error("Invalid KLE JSON: {message}")]
    Json {
        /// Parser message
        message: String,
    },

    /// No `<&key_physical_attrs ...>` tuple in the ZMK text
    #[error("ZMK physical layout not found")]
    ZmkLayoutNotFound,

    /// An attrs tuple with too few fields or unexpected tokens
    #[error("Invalid key definition: {fragment}")]
    ZmkInvalidKey {
        /// Offending text
        fragment: String,
    },

    /// An attrs field that is not a number
    #[error("Invalid numeric value `{value}` in {fragment}")]
    ZmkInvalidNumber {
        /// The field as written
        value: String,
        /// Enclosing attrs tuple
        fragment: String,
    },

    /// Input ended inside a tuple, list, string or comment
    #[error("Unterminated {what}: {fragment}")]
    ZmkUnterminated {
        /// What was left open
        what: &'static str,
        /// Text from the opening delimiter
        fragment: String,
    },

    /// The keymap lists a different number of bindings than there are keys
    #[error("ZMK keymap has {bindings} bindings but the physical layout has {keys} keys")]
    ZmkBindingCountMismatch {
        /// Number of attrs tuples
        keys: usize,
        /// Number of bindings in the first `bindings` property
        bindings: usize,
    },
}

/// Shortens `text` for quoting in an error message.
pub(crate) fn fragment(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(MAX_FRAGMENT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
