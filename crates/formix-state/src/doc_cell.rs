//! Shared mutable document with read-after-write consistency.
//!
//! `DocCell` wraps a `Mutex<Value>` so that writes through the path accessor
//! immediately update the document and subsequent reads see the latest values.

use crate::access::{
    append_at_path, delete_at_path, get_at_path, remove_index_at_path, set_at_path,
};
use crate::{Path, StateResult};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

/// Shared mutable document for write-through-read state access.
///
/// Reads lock briefly and clone what they return; the lock is never held
/// across an `.await`.
#[derive(Debug, Default)]
pub struct DocCell(Mutex<Value>);

impl DocCell {
    /// Create a new `DocCell` with the given initial value.
    pub fn new(value: Value) -> Self {
        Self(Mutex::new(value))
    }

    /// Acquire the document lock.
    ///
    /// A poisoned lock is recovered: every write leaves the document in a
    /// consistent state, so the data is still usable.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Value> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Clone the value at `path`, if present.
    pub fn get(&self, path: &Path) -> Option<Value> {
        get_at_path(&self.lock(), path).cloned()
    }

    /// Write `value` at `path`, creating intermediate containers.
    ///
    /// Returns whether the value was written (see [`set_at_path`]).
    pub fn set(&self, path: &Path, value: Value) -> bool {
        set_at_path(&mut self.lock(), path, value)
    }

    /// Delete the value at `path`, returning it if it existed.
    pub fn delete(&self, path: &Path) -> Option<Value> {
        delete_at_path(&mut self.lock(), path)
    }

    /// Append to the sequence at `path`, returning its new length.
    pub fn append(&self, path: &Path, item: Value) -> StateResult<usize> {
        append_at_path(&mut self.lock(), path, item)
    }

    /// Remove the sequence element at `index`, returning it when in range.
    pub fn remove_index(&self, path: &Path, index: usize) -> StateResult<Option<Value>> {
        remove_index_at_path(&mut self.lock(), path, index)
    }

    /// Replace the whole document.
    pub fn replace(&self, value: Value) -> Value {
        std::mem::replace(&mut *self.lock(), value)
    }

    /// Clone the current document value.
    pub fn snapshot(&self) -> Value {
        self.lock().clone()
    }
}
