//! Registered fields and their touched/disabled/error side-tables.

use crate::validator::ValidationIssue;
use formix_state::Path;
use std::collections::{HashMap, HashSet};

/// Per-field metadata held by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldEntry {
    /// `None` until validation assigns a message, and again after it clears.
    pub error: Option<String>,
    /// Set on blur and by submit; cleared by reset.
    pub touched: bool,
    /// Survives reset and re-registration.
    pub disabled: bool,
}

/// Ordered set of registered field paths plus their side-tables.
///
/// Registration order is preserved for iteration and each path appears once.
/// Touched and disabled flags may be written for any path; errors only for
/// registered ones.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    order: Vec<Path>,
    registered: HashSet<Path>,
    errors: HashMap<Path, String>,
    touched: HashSet<Path>,
    disabled: HashSet<Path>,
}

impl FieldRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path`, or reset it when already registered.
    ///
    /// Error and touched state are reset; the disabled flag is kept. Returns
    /// `true` on first registration.
    pub fn register(&mut self, path: Path) -> bool {
        self.errors.remove(&path);
        self.touched.remove(&path);
        if self.registered.insert(path.clone()) {
            self.order.push(path);
            true
        } else {
            false
        }
    }

    /// Whether `path` has been registered.
    pub fn is_registered(&self, path: &Path) -> bool {
        self.registered.contains(path)
    }

    /// Registered paths in first-registration order.
    pub fn paths(&self) -> &[Path] {
        &self.order
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no field is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Snapshot of a registered field's metadata.
    pub fn entry(&self, path: &Path) -> Option<FieldEntry> {
        if !self.is_registered(path) {
            return None;
        }
        Some(FieldEntry {
            error: self.errors.get(path).cloned(),
            touched: self.touched.contains(path),
            disabled: self.disabled.contains(path),
        })
    }

    /// Error message of `path`, if one is set.
    pub fn error(&self, path: &Path) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    /// Whether `path` is marked touched.
    pub fn is_touched(&self, path: &Path) -> bool {
        self.touched.contains(path)
    }

    /// Whether `path` is marked disabled.
    pub fn is_disabled(&self, path: &Path) -> bool {
        self.disabled.contains(path)
    }

    /// Current errors in registration order.
    pub fn errors(&self) -> Vec<ValidationIssue> {
        self.order
            .iter()
            .filter_map(|path| {
                self.errors
                    .get(path)
                    .map(|message| ValidationIssue::new(path, message.as_str()))
            })
            .collect()
    }

    /// Set or clear the error of a registered field.
    ///
    /// Writes to unregistered paths are ignored. Returns whether anything
    /// changed.
    pub fn set_error(&mut self, path: &Path, error: Option<String>) -> bool {
        if !self.is_registered(path) {
            return false;
        }
        match error {
            Some(message) => {
                if self.errors.get(path) == Some(&message) {
                    return false;
                }
                self.errors.insert(path.clone(), message);
                true
            }
            None => self.errors.remove(path).is_some(),
        }
    }

    /// Set or clear the touched flag of any path, registered or not.
    pub fn set_touched(&mut self, path: &Path, touched: bool) {
        if touched {
            self.touched.insert(path.clone());
        } else {
            self.touched.remove(path);
        }
    }

    /// Set or clear the disabled flag of any path, registered or not.
    pub fn set_disabled(&mut self, path: &Path, disabled: bool) {
        if disabled {
            self.disabled.insert(path.clone());
        } else {
            self.disabled.remove(path);
        }
    }

    /// Clear every error that is currently set. Returns how many were cleared.
    pub fn clear_errors(&mut self) -> usize {
        let cleared = self.errors.len();
        self.errors.clear();
        cleared
    }

    /// Mark every registered field touched.
    pub fn touch_all(&mut self) {
        self.touched.extend(self.order.iter().cloned());
    }

    /// Clear every touched flag.
    pub fn untouch_all(&mut self) {
        self.touched.clear();
    }

    /// True iff no registered field carries an error.
    pub fn is_valid(&self) -> bool {
        self.order.iter().all(|path| !self.errors.contains_key(path))
    }

    /// Reconcile a validation result onto the fields (clear-then-set).
    ///
    /// An empty result clears errors only when some are set. Otherwise all
    /// errors are cleared and each issue naming a registered field is
    /// applied; when several issues name the same field the first one wins.
    pub fn apply_issues(&mut self, issues: &[ValidationIssue]) {
        if issues.is_empty() {
            if !self.is_valid() {
                self.clear_errors();
            }
            return;
        }

        self.clear_errors();
        for issue in issues {
            if self.is_registered(&issue.path) && !self.errors.contains_key(&issue.path) {
                self.errors.insert(issue.path.clone(), issue.message.clone());
            }
        }
    }
}
