//! The editable layout document: ordered keys, selection, pitch and history.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::history::{History, Snapshot};
use crate::models::key_layout::normalize_angle;
use crate::models::{KeyId, KeyLayout, KeyPatch};

/// Standard keycap pitch in millimeters per unit.
pub const DEFAULT_PITCH_MM: f64 = 19.05;

/// Offset (in units) applied to duplicated keys so they don't hide the originals.
pub const DUPLICATE_OFFSET: f64 = 0.25;

/// Legend slot written by [`LayoutDocument::annotate_selected`] (top-left).
pub const ANNOTATION_LABEL_INDEX: usize = 0;

/// Presentation mode chosen by the editor front end.
///
/// Recorded for consumers only; geometry and codecs ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Free-form canvas editing
    #[default]
    Canvas,
    /// Node/list based editing
    Node,
}

/// Options for [`LayoutDocument::update_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Apply without recording an undo step (in-progress drags)
    pub skip_history: bool,
}

impl UpdateOptions {
    /// Options for a transient update that should not be undoable on its own.
    #[must_use]
    pub const fn transient() -> Self {
        Self { skip_history: true }
    }
}

/// Sequential switch numbering written by [`LayoutDocument::annotate_selected`].
///
/// The Nth key (ordered by x, then y) gets `prefix` followed by `start + N`,
/// zero-padded to `digits`, in its top-left legend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Text before the number
    pub prefix: String,
    /// Number given to the first key
    pub start: u32,
    /// Minimum number width; [`Annotation::default_digits`] when `None`
    pub digits: Option<usize>,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            prefix: "SW".to_string(),
            start: 1,
            digits: None,
        }
    }
}

impl Annotation {
    /// Sets the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the first number.
    #[must_use]
    pub const fn with_start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    /// Sets the number width (at least 1).
    #[must_use]
    pub const fn with_digits(mut self, digits: usize) -> Self {
        self.digits = Some(digits);
        self
    }

    /// Width that fits the largest number for `count` keys, never below 2.
    #[must_use]
    pub fn default_digits(start: u32, count: usize) -> usize {
        let last = u64::from(start) + count.saturating_sub(1) as u64;
        last.to_string().len().max(2)
    }

    /// Legend for the key at `index` among `count` annotated keys.
    #[must_use]
    pub fn label(&self, index: usize, count: usize) -> String {
        let width = self
            .digits
            .unwrap_or_else(|| Self::default_digits(self.start, count))
            .max(1);
        let number = u64::from(self.start) + index as u64;
        format!("{}{number:0width$}", self.prefix)
    }
}

/// In-memory layout being edited.
///
/// # Invariants
///
/// - Every id in the selection refers to an existing key
/// - The selection holds no duplicates; its first entry is the primary selection
/// - Every key's rotation angle lies in `[0, 360)`
///
/// # History
///
/// Key mutations record the pre-mutation key list so they can be undone.
/// Selection changes, pitch and view mode are not recorded.
#[derive(Debug, Clone)]
pub struct LayoutDocument {
    keys: Vec<KeyLayout>,
    selection: Vec<KeyId>,
    unit_pitch_mm: f64,
    view_mode: ViewMode,
    history: History,
}

impl Default for LayoutDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutDocument {
    /// Creates an empty document at the default pitch with unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(None)
    }

    /// Creates an empty document whose history keeps at most `limit` undo steps.
    #[must_use]
    pub fn with_history_limit(limit: Option<usize>) -> Self {
        Self {
            keys: Vec::new(),
            selection: Vec::new(),
            unit_pitch_mm: DEFAULT_PITCH_MM,
            view_mode: ViewMode::default(),
            history: History::with_limit(limit),
        }
    }

    /// Creates a document holding `keys` (see [`LayoutDocument::set_keys`]).
    #[must_use]
    pub fn from_keys(keys: Vec<KeyLayout>) -> Self {
        let mut document = Self::new();
        document.set_keys(keys);
        document
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// All keys in document order.
    #[must_use]
    pub fn keys(&self) -> &[KeyLayout] {
        &self.keys
    }

    /// Looks up a key by id.
    #[must_use]
    pub fn key(&self, id: KeyId) -> Option<&KeyLayout> {
        self.keys.iter().find(|key| key.id == id)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the document has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn selection(&self) -> &[KeyId] {
        &self.selection
    }

    /// The actively inspected key (first selected).
    #[must_use]
    pub fn primary_selection(&self) -> Option<&KeyLayout> {
        self.selection.first().and_then(|id| self.key(*id))
    }

    /// Selected keys in document order.
    #[must_use]
    pub fn selected_keys(&self) -> Vec<&KeyLayout> {
        self.keys
            .iter()
            .filter(|key| self.selection.contains(&key.id))
            .collect()
    }

    /// Returns true if `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: KeyId) -> bool {
        self.selection.contains(&id)
    }

    /// Physical millimeters per unit.
    #[must_use]
    pub const fn unit_pitch_mm(&self) -> f64 {
        self.unit_pitch_mm
    }

    /// Pixels per unit for a renderer whose default-pitch unit is `base_unit_px`.
    #[must_use]
    pub fn unit_px(&self, base_unit_px: f64) -> f64 {
        base_unit_px * self.unit_pitch_mm / DEFAULT_PITCH_MM
    }

    /// Current presentation mode.
    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Undo/redo stacks.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Returns true if there is something to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns true if there is something to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Owned copy of the current key list, e.g. taken when a drag starts.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.keys.clone()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replaces every key (a freshly loaded layout).
    ///
    /// Normalizes rotation angles and resets selection and history.
    pub fn set_keys(&mut self, keys: Vec<KeyLayout>) {
        self.keys = keys
            .into_iter()
            .map(|mut key| {
                key.rotation_angle = normalize_angle(key.rotation_angle);
                key
            })
            .collect();
        self.selection.clear();
        self.history.clear();
    }

    // ------------------------------------------------------------------
    // Key mutation
    // ------------------------------------------------------------------

    /// Merges `patch` into the key with `id`.
    ///
    /// Returns false (and records nothing) if the id is unknown or the merge
    /// changes nothing.
    pub fn update_key(&mut self, id: KeyId, patch: &KeyPatch, options: UpdateOptions) -> bool {
        let Some(index) = self.keys.iter().position(|key| key.id == id) else {
            return false;
        };

        let next = self.keys[index].patched(patch);
        if next == self.keys[index] {
            return false;
        }

        if !options.skip_history {
            self.history.record(self.keys.clone());
        }
        self.keys[index] = next;
        true
    }

    /// Adds `delta` degrees to every selected key's rotation.
    pub fn rotate_selected(&mut self, delta: f64) -> bool {
        if !delta.is_finite() {
            return false;
        }
        self.apply_to_selected(|key| {
            key.rotation_angle = normalize_angle(key.rotation_angle + delta);
        })
    }

    /// Moves every selected key (and its pivot) by `(dx, dy)` units.
    pub fn nudge_selected(&mut self, dx: f64, dy: f64) -> bool {
        if !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        self.apply_to_selected(|key| key.translate(dx, dy))
    }

    /// Copies the selected keys, offset by [`DUPLICATE_OFFSET`], and selects the copies.
    ///
    /// Returns the ids of the new keys.
    pub fn duplicate_selected(&mut self) -> Vec<KeyId> {
        if self.selection.is_empty() {
            return Vec::new();
        }

        let copies: Vec<KeyLayout> = self
            .keys
            .iter()
            .filter(|key| self.selection.contains(&key.id))
            .map(|key| {
                let mut copy = key.clone();
                copy.id = KeyId::new();
                copy.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
                copy
            })
            .collect();

        self.history.record(self.keys.clone());
        let new_ids: Vec<KeyId> = copies.iter().map(|key| key.id).collect();
        self.keys.extend(copies);
        self.selection.clone_from(&new_ids);
        new_ids
    }

    /// Removes the selected keys and clears the selection.
    pub fn delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }

        let selected: HashSet<KeyId> = self.selection.iter().copied().collect();
        self.history.record(self.keys.clone());
        self.keys.retain(|key| !selected.contains(&key.id));
        self.selection.clear();
        true
    }

    /// Numbers the selected keys' top-left legends, left to right then top to
    /// bottom, as a single undo step.
    ///
    /// The binding is kept since the primary legend is untouched.
    pub fn annotate_selected(&mut self, annotation: &Annotation) -> bool {
        let mut ordered: Vec<(KeyId, f64, f64)> = self
            .keys
            .iter()
            .filter(|key| self.selection.contains(&key.id))
            .map(|key| (key.id, key.x, key.y))
            .collect();
        if ordered.is_empty() {
            return false;
        }
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)));

        let count = ordered.len();
        let before = self.keys.clone();
        for (index, (id, _, _)) in ordered.into_iter().enumerate() {
            if let Some(key) = self.keys.iter_mut().find(|key| key.id == id) {
                key.labels[ANNOTATION_LABEL_INDEX] = annotation.label(index, count);
            }
        }

        if self.keys == before {
            return false;
        }
        self.history.record(before);
        true
    }

    /// Records `snapshot` as one undo step, typically the state before a drag
    /// whose intermediate updates used [`UpdateOptions::transient`].
    pub fn commit_history(&mut self, snapshot: Snapshot) {
        self.history.record(snapshot);
    }

    /// Applies `edit` to each selected key as a single undo step.
    fn apply_to_selected(&mut self, mut edit: impl FnMut(&mut KeyLayout)) -> bool {
        if self.selection.is_empty() {
            return false;
        }

        let selected: HashSet<KeyId> = self.selection.iter().copied().collect();
        let before = self.keys.clone();
        for key in self.keys.iter_mut().filter(|key| selected.contains(&key.id)) {
            edit(key);
        }

        if self.keys == before {
            return false;
        }
        self.history.record(before);
        true
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Restores the key list before the last recorded mutation.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.keys) {
            Some(previous) => {
                self.keys = previous;
                self.selection.clear();
                true
            }
            None => false,
        }
    }

    /// Re-applies the last undone mutation.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.keys) {
            Some(next) => {
                self.keys = next;
                self.selection.clear();
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Adds `id` to the selection, or removes it if already selected.
    pub fn toggle_select(&mut self, id: KeyId) -> bool {
        if let Some(index) = self.selection.iter().position(|selected| *selected == id) {
            self.selection.remove(index);
            return true;
        }
        if self.key(id).is_none() {
            return false;
        }
        self.selection.push(id);
        true
    }

    /// Selects only `id`.
    pub fn select_key(&mut self, id: KeyId) -> bool {
        if self.key(id).is_none() {
            return false;
        }
        self.selection = vec![id];
        true
    }

    /// Replaces the selection, dropping duplicates and unknown ids.
    pub fn set_selected_keys(&mut self, ids: impl IntoIterator<Item = KeyId>) {
        let mut seen = HashSet::new();
        self.selection = ids
            .into_iter()
            .filter(|id| self.keys.iter().any(|key| key.id == *id))
            .filter(|id| seen.insert(*id))
            .collect();
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Sets the unit pitch; invalid values fall back to [`DEFAULT_PITCH_MM`].
    pub fn set_unit_pitch(&mut self, pitch_mm: f64) {
        self.unit_pitch_mm = if pitch_mm.is_finite() && pitch_mm > 0.0 {
            pitch_mm
        } else {
            DEFAULT_PITCH_MM
        };
    }

    /// Sets the presentation mode.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }
}
