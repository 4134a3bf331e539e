//! Per-field and per-array views onto a [`Form`].

use crate::error::FormResult;
use crate::form::Form;
use formix_state::Path;
use serde::Serialize;
use serde_json::Value;

/// Everything a UI needs to render one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMeta {
    /// Current value; `None` if nothing is stored at the field's path.
    pub value: Option<Value>,
    /// Value in the initial snapshot.
    pub initial_value: Option<Value>,
    /// Error from the last validation run or a manual write.
    pub error: Option<String>,
    pub touched: bool,
    pub disabled: bool,
}

/// Handle to one registered field.
///
/// Owns a clone of the form, so it stays usable for as long as it is held.
#[derive(Debug, Clone)]
pub struct FieldHandle {
    form: Form,
    path: Path,
}

impl FieldHandle {
    pub(crate) fn new(form: Form, path: Path) -> Self {
        Self { form, path }
    }

    /// Path of this field.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value.
    pub fn value(&self) -> Option<Value> {
        self.form.get_value(&self.path)
    }

    /// Value in the initial snapshot.
    pub fn initial_value(&self) -> Option<Value> {
        self.form.get_initial_value(&self.path)
    }

    /// Current error message, if any.
    pub fn error(&self) -> Option<String> {
        self.form.field_meta(&self.path).and_then(|meta| meta.error)
    }

    /// Whether the field has been blurred or touched by submit.
    pub fn touched(&self) -> bool {
        self.form.field_meta(&self.path).is_some_and(|meta| meta.touched)
    }

    /// Whether the field is disabled.
    pub fn disabled(&self) -> bool {
        self.form.field_meta(&self.path).is_some_and(|meta| meta.disabled)
    }

    /// `None` only if the form forgot this field, which registration never does.
    pub fn meta(&self) -> Option<FieldMeta> {
        self.form.field_meta(&self.path)
    }

    /// Write a new value and schedule validation.
    pub fn set_value(&self, value: Value) {
        self.form.set_field_value(&self.path, value);
    }

    /// Enable or disable the field.
    pub fn set_disabled(&self, disabled: bool) {
        self.form.set_field_disabled(&self.path, disabled);
    }

    /// Set the touched flag; `true` schedules validation.
    pub fn set_touched(&self, touched: bool) {
        self.form.set_field_touched(&self.path, touched);
    }

    /// Mark the field touched and schedule validation.
    pub fn blur(&self) {
        self.set_touched(true);
    }

    /// Restore the initial value and clear the touched flag.
    ///
    /// A field with no initial value is removed from the document.
    pub fn reset(&self) {
        self.form.reset_field(&self.path);
    }
}

/// Handle to a sequence-valued field with push/remove helpers.
#[derive(Debug, Clone)]
pub struct ArrayFieldHandle {
    form: Form,
    path: Path,
}

impl ArrayFieldHandle {
    pub(crate) fn new(form: Form, path: Path) -> Self {
        Self { form, path }
    }

    /// Path of the sequence.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current elements; empty when the path holds no sequence.
    pub fn values(&self) -> Vec<Value> {
        match self.form.get_value(&self.path) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// True when the sequence is missing or has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an element and schedule validation.
    pub fn push(&self, item: Value) -> FormResult<()> {
        self.form.push(&self.path, item)
    }

    /// Remove the element at `index` and schedule validation.
    pub fn remove(&self, index: usize) -> FormResult<Option<Value>> {
        self.form.remove(&self.path, index)
    }
}
