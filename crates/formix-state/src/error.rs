//! Error types for formix-state operations.
//!
//! Path misses are not errors: reads return `None`. Errors only arise when an
//! operation needs a specific container kind and finds another.

use crate::Path;
use thiserror::Error;

/// Result type alias for formix-state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during formix-state operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// Type mismatch when accessing a value.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// The expected type.
        expected: &'static str,
        /// The actual type found.
        found: &'static str,
    },

    /// Append operation requires a sequence value.
    #[error("append requires array value at {path}")]
    AppendRequiresArray {
        /// The path where a non-array was found.
        path: Path,
    },
}

impl StateError {
    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        StateError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    /// Create an append requires array error.
    #[inline]
    pub fn append_requires_array(path: Path) -> Self {
        StateError::AppendRequiresArray { path }
    }
}

/// Get the type name of a JSON value.
#[inline]
pub fn value_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
