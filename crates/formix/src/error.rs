//! Error types for form operations.

use formix_state::StateError;
use thiserror::Error;

/// Result type alias for form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Errors surfaced by the form coordinator.
///
/// Routine "field not found" conditions are not errors; reads return `None`.
#[derive(Debug, Error)]
pub enum FormError {
    /// The validator failed to produce a result.
    #[error("validator failed: {0}")]
    Validator(String),

    /// The submit handler failed.
    #[error("submit handler failed: {0}")]
    Submit(String),

    /// `submit_form` was called while another submission was in flight.
    #[error("form is already submitting")]
    AlreadySubmitting,

    /// A document operation found an incompatible value.
    #[error(transparent)]
    State(#[from] StateError),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FormError {
    /// Create a validator error.
    #[inline]
    pub fn validator(message: impl Into<String>) -> Self {
        FormError::Validator(message.into())
    }

    /// Create a submit handler error.
    #[inline]
    pub fn submit(message: impl Into<String>) -> Self {
        FormError::Submit(message.into())
    }
}
