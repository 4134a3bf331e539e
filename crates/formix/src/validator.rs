//! Validator and submit handler contracts.
//!
//! Schema-library adapters live outside this crate: anything that can turn the
//! current values into a list of `{path, message}` pairs is a [`Validator`].

use crate::error::FormResult;
use async_trait::async_trait;
use formix_state::Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// One error reported by a validator.
///
/// The path deserializes from either an expression (`"items[0].name"`) or a
/// key sequence (`["items", 0, "name"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Field the message belongs to.
    pub path: Path,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationIssue {
    /// Issue for `path` with the given message.
    pub fn new(path: impl Into<Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validates a snapshot of the form values.
///
/// An empty result means every known field is valid. Returning `Err` is a
/// validator fault: field errors are left unchanged and the fault is reported
/// to whoever requested the run.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, values: &Value) -> FormResult<Vec<ValidationIssue>>;
}

/// Receives the values of a valid form on submit.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: Value) -> FormResult<()>;
}

/// [`Validator`] backed by an async closure.
pub struct FnValidator<F>(F);

/// Wrap an async closure as a [`Validator`].
///
/// ```
/// use formix::{validator_fn, ValidationIssue};
///
/// let validator = validator_fn(|values| async move {
///     let mut issues = Vec::new();
///     if values.get("email").and_then(|v| v.as_str()).unwrap_or("").is_empty() {
///         issues.push(ValidationIssue::new("email", "required"));
///     }
///     Ok(issues)
/// });
/// # let _ = validator;
/// ```
pub fn validator_fn<F, Fut>(f: F) -> FnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FormResult<Vec<ValidationIssue>>> + Send + 'static,
{
    FnValidator(f)
}

#[async_trait]
impl<F, Fut> Validator for FnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FormResult<Vec<ValidationIssue>>> + Send + 'static,
{
    async fn validate(&self, values: &Value) -> FormResult<Vec<ValidationIssue>> {
        (self.0)(values.clone()).await
    }
}

/// [`SubmitHandler`] backed by an async closure.
pub struct FnSubmitHandler<F>(F);

/// Wrap an async closure as a [`SubmitHandler`].
pub fn submit_fn<F, Fut>(f: F) -> FnSubmitHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FormResult<()>> + Send + 'static,
{
    FnSubmitHandler(f)
}

#[async_trait]
impl<F, Fut> SubmitHandler for FnSubmitHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FormResult<()>> + Send + 'static,
{
    async fn submit(&self, values: Value) -> FormResult<()> {
        (self.0)(values).await
    }
}
