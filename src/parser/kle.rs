//! KLE (keyboard-layout-editor.com) import.
//!
//! A KLE document is an array of rows. Each row is an array whose items are
//! either legend strings (a key) or property objects that adjust the cursor
//! for the keys that follow:
//!
//! ```json
//! [
//!   {"name": "metadata rows are skipped"},
//!   [{"w": 1.5}, "Tab", "Q"],
//!   [{"r": 15, "rx": 4, "ry": 1}, "T", {"labels": ["", "", "", "", "G"]}]
//! ]
//! ```
//!
//! # Cursor Rules
//!
//! - Every row starts at `x = rx`; after a row `x = rx` and `y += 1`
//! - `rx`/`ry` move the cursor to the new rotation origin, then `x`/`y`
//!   are added as deltas
//! - `w`/`h` apply to the next key only
//! - Every key uses the current `r` about `(rx, ry)`
//!
//! Display properties (`a`, `f`, `c`, `t`, ...) are ignored.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::models::{
    default_binding, labels_from_slice, primary_labels, KeyLayout, Labels, Point,
    PRIMARY_LABEL_INDEX,
};
use crate::parser::error::{fragment, ImportError};

/// Parses KLE text, accepting the relaxed JSON5 syntax of KLE "raw data"
/// (unquoted property names, trailing commas).
pub fn import_kle_str(text: &str) -> Result<Vec<KeyLayout>, ImportError> {
    let value: Value = json5::from_str(text).map_err(|e| ImportError::Json {
        message: e.to_string(),
    })?;
    import_kle(&value)
}

/// Converts a parsed KLE document into keys, in reading order.
///
/// Fails without a partial result on any malformed row or item.
pub fn import_kle(document: &Value) -> Result<Vec<KeyLayout>, ImportError> {
    let rows = document.as_array().ok_or(ImportError::KleNotArray)?;

    let mut cursor = Cursor::default();
    let mut keys = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        let items = match row {
            Value::Array(items) => items,
            Value::Object(_) => {
                debug!(row = row_index, "Skipping KLE metadata row");
                continue;
            }
            other => {
                return Err(ImportError::KleRowNotArray {
                    row: row_index,
                    fragment: fragment(&other.to_string()),
                })
            }
        };

        cursor.start_row();
        for (item_index, item) in items.iter().enumerate() {
            let position = ItemPosition {
                row: row_index,
                item: item_index,
            };
            match item {
                Value::String(legend) => keys.push(cursor.emit(primary_labels(legend.as_str()))),
                Value::Object(props) => match props.get("labels") {
                    Some(labels) => {
                        let labels = parse_labels(labels, position)?;
                        keys.push(cursor.emit(labels));
                    }
                    None => cursor.apply_properties(props, position)?,
                },
                other => {
                    return Err(ImportError::KleInvalidToken {
                        row: row_index,
                        item: item_index,
                        fragment: fragment(&other.to_string()),
                    })
                }
            }
        }
        cursor.end_row();
    }

    debug!(rows = rows.len(), keys = keys.len(), "Imported KLE layout");
    Ok(keys)
}

#[derive(Debug, Clone, Copy)]
struct ItemPosition {
    row: usize,
    item: usize,
}

/// Running KLE parser state.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    r: f64,
    rx: f64,
    ry: f64,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
            r: 0.0,
            rx: 0.0,
            ry: 0.0,
        }
    }
}

impl Cursor {
    fn start_row(&mut self) {
        self.x = self.rx;
    }

    fn end_row(&mut self) {
        self.x = self.rx;
        self.y += 1.0;
    }

    fn apply_properties(
        &mut self,
        props: &Map<String, Value>,
        position: ItemPosition,
    ) -> Result<(), ImportError> {
        let number = |field: &str| -> Result<Option<f64>, ImportError> {
            match props.get(field) {
                None => Ok(None),
                Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                    ImportError::KleInvalidNumber {
                        row: position.row,
                        item: position.item,
                        field: field.to_string(),
                        fragment: fragment(&value.to_string()),
                    }
                }),
            }
        };

        if let Some(r) = number("r")? {
            self.r = r;
        }
        if let Some(rx) = number("rx")? {
            self.rx = rx;
            self.x = rx;
        }
        if let Some(ry) = number("ry")? {
            self.ry = ry;
            self.y = ry;
        }
        if let Some(dx) = number("x")? {
            self.x += dx;
        }
        if let Some(dy) = number("y")? {
            self.y += dy;
        }
        if let Some(w) = number("w")? {
            self.w = w;
        }
        if let Some(h) = number("h")? {
            self.h = h;
        }

        trace!(x = self.x, y = self.y, r = self.r, "Applied KLE properties");
        Ok(())
    }

    /// Emits a key at the cursor and advances past it.
    fn emit(&mut self, labels: Labels) -> KeyLayout {
        let binding = default_binding(&labels[PRIMARY_LABEL_INDEX]);
        let key = KeyLayout::new(self.x, self.y)
            .with_size(self.w, self.h)
            .with_rotation(self.r, Point::new(self.rx, self.ry))
            .with_labels(labels)
            .with_binding(binding);

        self.x += self.w;
        self.w = 1.0;
        self.h = 1.0;
        key
    }
}

fn parse_labels(value: &Value, position: ItemPosition) -> Result<Labels, ImportError> {
    let entries = value.as_array().ok_or_else(|| ImportError::KleInvalidLabels {
        row: position.row,
        item: position.item,
        fragment: fragment(&value.to_string()),
    })?;

    let legends: Vec<&str> = entries
        .iter()
        .map(|entry| entry.as_str().unwrap_or_default())
        .collect();
    Ok(labels_from_slice(&legends))
}
