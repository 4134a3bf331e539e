//! The form coordinator.
//!
//! A [`Form`] owns the current values, the initial snapshot, the field
//! registry and the validation scheduler. Mutations land in the document
//! immediately and schedule a debounced validation pass; field errors catch
//! up once the validator resolves.

use crate::config::FormConfig;
use crate::error::{FormError, FormResult};
use crate::field::{ArrayFieldHandle, FieldHandle, FieldMeta};
use crate::registry::FieldRegistry;
use crate::scheduler::{ValidationPhase, ValidationScheduler, ValidationTarget};
use crate::validator::{SubmitHandler, ValidationIssue, Validator};
use formix_state::{DocCell, Path};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Result of [`Form::submit_form`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The form was valid and the submit handler (if any) succeeded.
    Submitted,
    /// Validation left errors on registered fields; the handler was not called.
    Invalid { errors: Vec<ValidationIssue> },
}

impl SubmitOutcome {
    /// True for [`SubmitOutcome::Submitted`].
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted)
    }
}

/// Builder for a [`Form`].
pub struct FormBuilder {
    initial_values: Value,
    validator: Option<Arc<dyn Validator>>,
    submit_handler: Option<Arc<dyn SubmitHandler>>,
    config: FormConfig,
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self {
            initial_values: Value::Object(Map::new()),
            validator: None,
            submit_handler: None,
            config: FormConfig::default(),
        }
    }
}

impl FormBuilder {
    /// Values the form starts from and resets to.
    #[must_use]
    pub fn with_initial_values(mut self, values: Value) -> Self {
        self.initial_values = values;
        self
    }

    /// Validator run after mutations and before submit.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Handler receiving the values of a valid form.
    #[must_use]
    pub fn with_submit_handler(mut self, handler: Arc<dyn SubmitHandler>) -> Self {
        self.submit_handler = Some(handler);
        self
    }

    /// Debounce and reinitialization settings.
    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the form. Values start as a copy of the initial values.
    pub fn build(self) -> Form {
        let scheduler = ValidationScheduler::new(self.validator, self.config.validate_debounce());
        Form {
            inner: Arc::new(FormInner {
                values: DocCell::new(self.initial_values.clone()),
                initial: DocCell::new(self.initial_values),
                registry: Mutex::new(FieldRegistry::new()),
                submitting: AtomicBool::new(false),
                scheduler,
                submit_handler: Mutex::new(self.submit_handler),
                config: self.config,
            }),
        }
    }
}

/// Form state coordinator.
///
/// Cheap to clone; clones share the same state. Operations that schedule
/// validation must run inside a tokio runtime.
///
/// # Examples
///
/// ```
/// use formix::Form;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let form = Form::new(json!({"name": "", "tags": []}));
/// let name = form.register_field("name");
///
/// name.set_value(json!("Ada"));
/// form.push("tags", json!("math")).unwrap();
///
/// assert_eq!(form.values(), json!({"name": "Ada", "tags": ["math"]}));
/// assert!(form.is_dirty());
/// # }
/// ```
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

struct FormInner {
    values: DocCell,
    initial: DocCell,
    registry: Mutex<FieldRegistry>,
    submitting: AtomicBool,
    scheduler: ValidationScheduler,
    submit_handler: Mutex<Option<Arc<dyn SubmitHandler>>>,
    config: FormConfig,
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl FormInner {
    fn registry(&self) -> MutexGuard<'_, FieldRegistry> {
        mutex_lock(&self.registry)
    }
}

impl ValidationTarget for FormInner {
    fn snapshot(&self) -> Value {
        self.values.snapshot()
    }

    fn apply_issues(&self, issues: &[ValidationIssue]) {
        self.registry().apply_issues(issues);
    }
}

/// Holds the submitting flag for the lifetime of one submission.
struct SubmittingGuard<'a>(&'a AtomicBool);

impl<'a> SubmittingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Form {
    /// Form with the given initial values, no validator and default config.
    pub fn new(initial_values: Value) -> Self {
        Self::builder().with_initial_values(initial_values).build()
    }

    /// Start building a form; initial values default to an empty mapping.
    pub fn builder() -> FormBuilder {
        FormBuilder::default()
    }

    /// Current configuration, including a debounce window changed through
    /// [`set_validate_debounce`](Self::set_validate_debounce).
    pub fn config(&self) -> FormConfig {
        self.inner
            .config
            .clone()
            .with_validate_debounce(self.inner.scheduler.debounce())
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// Install, replace or remove the validator.
    ///
    /// Takes effect on the next validation run, including one already
    /// scheduled. Does not schedule a run by itself.
    pub fn set_validator(&self, validator: Option<Arc<dyn Validator>>) {
        tracing::debug!(installed = validator.is_some(), "validator replaced");
        self.inner.scheduler.set_validator(validator);
    }

    /// Change the debounce window for validation requests made afterwards.
    pub fn set_validate_debounce(&self, debounce: Duration) {
        self.inner.scheduler.set_debounce(debounce);
    }

    /// Install, replace or remove the submit handler used by
    /// [`submit_form`](Self::submit_form).
    pub fn set_submit_handler(&self, handler: Option<Arc<dyn SubmitHandler>>) {
        *mutex_lock(&self.inner.submit_handler) = handler;
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Register a field and schedule validation.
    ///
    /// Registering an already known path resets its error and touched state.
    pub fn register_field(&self, path: impl Into<Path>) -> FieldHandle {
        let path = path.into();
        let first = self.inner.registry().register(path.clone());
        tracing::debug!(path = %path, first, "field registered");
        self.enqueue_validation();
        FieldHandle::new(self.clone(), path)
    }

    /// Whether `path` has been registered as a field.
    pub fn is_registered(&self, path: impl Into<Path>) -> bool {
        self.inner.registry().is_registered(&path.into())
    }

    /// Registered paths in registration order.
    pub fn registered_fields(&self) -> Vec<Path> {
        self.inner.registry().paths().to_vec()
    }

    /// Write a value and schedule validation. Unregistered paths are written too.
    ///
    /// A key that addresses an existing sequence cannot hold the value; such
    /// writes leave the document unchanged.
    pub fn set_field_value(&self, path: impl Into<Path>, value: Value) {
        let path = path.into();
        if !self.inner.values.set(&path, value) {
            tracing::debug!(path = %path, "write dropped: key addresses a sequence");
        }
        self.enqueue_validation();
    }

    /// Set the disabled flag. Works for any path and never schedules
    /// validation.
    pub fn set_field_disabled(&self, path: impl Into<Path>, disabled: bool) {
        self.inner.registry().set_disabled(&path.into(), disabled);
    }

    /// Set the touched flag; marking a field touched schedules validation.
    pub fn set_field_touched(&self, path: impl Into<Path>, touched: bool) {
        self.inner.registry().set_touched(&path.into(), touched);
        if touched {
            self.enqueue_validation();
        }
    }

    /// Set or clear a field error by hand. Ignored for unregistered paths.
    pub fn set_field_error(&self, path: impl Into<Path>, error: Option<String>) {
        self.inner.registry().set_error(&path.into(), error);
    }

    /// Current value at `path`; `None` if nothing is there.
    pub fn get_value(&self, path: impl Into<Path>) -> Option<Value> {
        self.inner.values.get(&path.into())
    }

    /// Value at `path` in the initial snapshot.
    pub fn get_initial_value(&self, path: impl Into<Path>) -> Option<Value> {
        self.inner.initial.get(&path.into())
    }

    /// Value, initial value and side-table state of a registered field.
    pub fn field_meta(&self, path: impl Into<Path>) -> Option<FieldMeta> {
        let path = path.into();
        let entry = self.inner.registry().entry(&path)?;
        Some(FieldMeta {
            value: self.inner.values.get(&path),
            initial_value: self.inner.initial.get(&path),
            error: entry.error,
            touched: entry.touched,
            disabled: entry.disabled,
        })
    }

    /// Restore one field's initial value, untouch it and schedule validation.
    pub fn reset_field(&self, path: impl Into<Path>) {
        let path = path.into();
        match self.inner.initial.get(&path) {
            Some(initial) => {
                self.inner.values.set(&path, initial);
            }
            None => {
                self.inner.values.delete(&path);
            }
        }
        self.inner.registry().set_touched(&path, false);
        self.enqueue_validation();
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Snapshot of the current values.
    pub fn values(&self) -> Value {
        self.inner.values.snapshot()
    }

    /// Deserialize the current values into `T`.
    pub fn values_as<T: DeserializeOwned>(&self) -> FormResult<T> {
        Ok(serde_json::from_value(self.values())?)
    }

    /// Snapshot of the initial values.
    pub fn initial_values(&self) -> Value {
        self.inner.initial.snapshot()
    }

    /// Whether the values differ from the initial snapshot.
    pub fn is_dirty(&self) -> bool {
        self.inner.values.snapshot() != self.inner.initial.snapshot()
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    /// Append to the sequence at `path` and schedule validation.
    ///
    /// A missing or `null` target becomes a one-element sequence.
    pub fn push(&self, path: impl Into<Path>, item: Value) -> FormResult<()> {
        self.inner.values.append(&path.into(), item)?;
        self.enqueue_validation();
        Ok(())
    }

    /// Remove the element at `index` from the sequence at `path`.
    ///
    /// Out-of-range indexes leave the sequence unchanged and return `None`.
    pub fn remove(&self, path: impl Into<Path>, index: usize) -> FormResult<Option<Value>> {
        let removed = self.inner.values.remove_index(&path.into(), index)?;
        self.enqueue_validation();
        Ok(removed)
    }

    /// Handle for the sequence at `path`. The sequence need not exist yet.
    pub fn array_field(&self, path: impl Into<Path>) -> ArrayFieldHandle {
        ArrayFieldHandle::new(self.clone(), path.into())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Touch every field, validate now and hand the values to the submit
    /// handler when the form is valid.
    ///
    /// A submission already in flight makes this return
    /// [`FormError::AlreadySubmitting`]. Validator and handler faults are
    /// returned as-is; `is_submitting` is false again afterwards either way.
    pub async fn submit_form(&self) -> FormResult<SubmitOutcome> {
        let _submitting = SubmittingGuard::acquire(&self.inner.submitting)
            .ok_or(FormError::AlreadySubmitting)?;

        self.touch_all();
        self.validate().await?;

        let errors = self.errors();
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "submit blocked by validation errors");
            return Ok(SubmitOutcome::Invalid { errors });
        }

        let handler = mutex_lock(&self.inner.submit_handler).clone();
        if let Some(handler) = handler {
            handler.submit(self.values()).await?;
        }
        tracing::debug!("form submitted");
        Ok(SubmitOutcome::Submitted)
    }

    /// Restore the initial values, clear errors and untouch every field.
    ///
    /// Fields stay registered and the disabled flags are kept.
    pub fn reset_form(&self) {
        self.inner.values.replace(self.inner.initial.snapshot());
        let mut registry = self.inner.registry();
        registry.clear_errors();
        registry.untouch_all();
        tracing::debug!(fields = registry.len(), "form reset");
    }

    /// Replace the initial snapshot and reset the form to it.
    pub fn set_initial_values(&self, values: Value) {
        self.inner.initial.replace(values);
        self.reset_form();
    }

    /// Adopt new initial values when reinitialization is enabled and they
    /// differ from the current snapshot. Returns whether the form was reset.
    pub fn reinitialize(&self, values: Value) -> bool {
        if !self.inner.config.enable_reinitialize || self.inner.initial.snapshot() == values {
            return false;
        }
        self.set_initial_values(values);
        true
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate immediately, bypassing the debounce window.
    pub async fn validate(&self) -> FormResult<()> {
        self.inner.scheduler.run_now(self.inner.as_ref()).await
    }

    /// Schedule a debounced validation pass.
    pub fn enqueue_validation(&self) {
        self.inner.scheduler.enqueue(&self.inner);
    }

    /// Clear every field error without running the validator.
    pub fn clear_errors(&self) {
        self.inner.registry().clear_errors();
    }

    /// Mark every registered field touched.
    pub fn touch_all(&self) {
        self.inner.registry().touch_all();
    }

    /// Current errors of registered fields, in registration order.
    pub fn errors(&self) -> Vec<ValidationIssue> {
        self.inner.registry().errors()
    }

    /// True iff no registered field carries an error.
    pub fn is_valid(&self) -> bool {
        self.inner.registry().is_valid()
    }

    /// True while [`submit_form`](Self::submit_form) is in flight.
    pub fn is_submitting(&self) -> bool {
        self.inner.submitting.load(Ordering::SeqCst)
    }

    /// Whether validation is idle, scheduled or running.
    pub fn validation_phase(&self) -> ValidationPhase {
        self.inner.scheduler.phase()
    }

    /// Number of validator calls made so far.
    pub fn validation_runs(&self) -> u64 {
        self.inner.scheduler.invocations()
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("values", &self.values())
            .field("fields", &self.inner.registry().len())
            .field("submitting", &self.is_submitting())
            .field("scheduler", &self.inner.scheduler)
            .field("config", &self.config())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{submit_fn, validator_fn};
    use serde::Deserialize;
    use serde_json::json;

    fn required(field: &'static str) -> Arc<dyn Validator> {
        Arc::new(validator_fn(move |values: Value| async move {
            let empty = values
                .get(field)
                .and_then(Value::as_str)
                .map_or(true, str::is_empty);
            if empty {
                Ok(vec![ValidationIssue::new(field, "required")])
            } else {
                Ok(vec![])
            }
        }))
    }

    #[tokio::test]
    async fn test_new_form_starts_from_initial_values() {
        let form = Form::new(json!({"a": 1}));
        assert_eq!(form.values(), json!({"a": 1}));
        assert_eq!(form.initial_values(), json!({"a": 1}));
        assert!(!form.is_dirty());
        assert!(form.is_valid());
        assert!(!form.is_submitting());
        assert_eq!(form.validation_phase(), ValidationPhase::Idle);
    }

    #[tokio::test]
    async fn test_builder_defaults_to_empty_mapping() {
        let form = Form::builder().build();
        assert_eq!(form.values(), json!({}));
        assert_eq!(form.config(), FormConfig::default());
    }

    #[tokio::test]
    async fn test_set_value_on_unregistered_path() {
        let form = Form::new(json!({}));
        form.set_field_value("x.y", json!(1));
        assert_eq!(form.get_value("x.y"), Some(json!(1)));
        assert!(form.field_meta("x.y").is_none());
    }

    #[tokio::test]
    async fn test_field_meta_reflects_side_tables() {
        let form = Form::new(json!({"name": "a"}));
        form.register_field("name");
        form.set_field_value("name", json!("b"));
        form.set_field_disabled("name", true);
        form.set_field_touched("name", true);
        form.set_field_error("name", Some("bad".into()));

        let meta = form.field_meta("name").unwrap();
        assert_eq!(
            meta,
            FieldMeta {
                value: Some(json!("b")),
                initial_value: Some(json!("a")),
                error: Some("bad".into()),
                touched: true,
                disabled: true,
            }
        );
    }

    #[tokio::test]
    async fn test_manual_error_ignored_for_unknown_field() {
        let form = Form::new(json!({}));
        form.set_field_error("ghost", Some("x".into()));
        assert!(form.is_valid());
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn test_validate_applies_issues() {
        let form = Form::builder()
            .with_initial_values(json!({"email": ""}))
            .with_validator(required("email"))
            .build();
        form.register_field("email");

        form.validate().await.unwrap();
        assert!(!form.is_valid());
        assert_eq!(form.errors(), vec![ValidationIssue::new("email", "required")]);

        form.set_field_value("email", json!("a@b.c"));
        form.validate().await.unwrap();
        assert!(form.is_valid());
    }

    #[tokio::test]
    async fn test_submit_without_handler() {
        let form = Form::new(json!({"a": 1}));
        form.register_field("a");
        let outcome = form.submit_form().await.unwrap();
        assert!(outcome.is_submitted());
        assert!(form.field_meta("a").unwrap().touched);
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_submit_guard_rejects_second_submission() {
        let form = Form::new(json!({}));
        let _held = SubmittingGuard::acquire(&form.inner.submitting).unwrap();
        assert!(form.is_submitting());
        let err = form.submit_form().await.unwrap_err();
        assert!(matches!(err, FormError::AlreadySubmitting));
        assert!(form.is_submitting());
    }

    #[tokio::test]
    async fn test_submit_handler_receives_values() {
        let received = Arc::new(Mutex::new(None));
        let handler = {
            let received = received.clone();
            submit_fn(move |values: Value| {
                let received = received.clone();
                async move {
                    *received.lock().unwrap() = Some(values);
                    Ok(())
                }
            })
        };
        let form = Form::builder()
            .with_initial_values(json!({"n": 1}))
            .with_submit_handler(Arc::new(handler))
            .build();
        form.set_field_value("n", json!(2));

        form.submit_form().await.unwrap();
        assert_eq!(*received.lock().unwrap(), Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn test_reset_field_restores_or_deletes() {
        let form = Form::new(json!({"a": 1}));
        let a = form.register_field("a");
        let b = form.register_field("b");
        a.set_value(json!(5));
        b.set_value(json!("new"));
        a.blur();

        a.reset();
        b.reset();
        assert_eq!(form.values(), json!({"a": 1}));
        assert!(!a.touched());
    }

    #[tokio::test]
    async fn test_reinitialize_requires_opt_in() {
        let form = Form::new(json!({"a": 1}));
        assert!(!form.reinitialize(json!({"a": 2})));
        assert_eq!(form.values(), json!({"a": 1}));

        let form = Form::builder()
            .with_initial_values(json!({"a": 1}))
            .with_config(FormConfig::default().with_enable_reinitialize(true))
            .build();
        assert!(!form.reinitialize(json!({"a": 1})));
        assert!(form.reinitialize(json!({"a": 2})));
        assert_eq!(form.values(), json!({"a": 2}));
        assert_eq!(form.initial_values(), json!({"a": 2}));
    }

    #[tokio::test]
    async fn test_values_as_typed() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Login {
            user: String,
            remember: bool,
        }

        let form = Form::new(json!({"user": "ada", "remember": false}));
        form.set_field_value("remember", json!(true));
        let login: Login = form.values_as().unwrap();
        assert_eq!(
            login,
            Login {
                user: "ada".into(),
                remember: true
            }
        );
        assert!(form.values_as::<Vec<String>>().is_err());
    }

    #[tokio::test]
    async fn test_push_onto_scalar_fails() {
        let form = Form::new(json!({"a": 1}));
        let err = form.push("a", json!(2)).unwrap_err();
        assert!(matches!(err, FormError::State(_)));
        assert_eq!(form.values(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_submit_outcome_serializes_tagged() {
        let outcome = SubmitOutcome::Invalid {
            errors: vec![ValidationIssue::new("a", "required")],
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "invalid", "errors": [{"path": ["a"], "message": "required"}]})
        );
        assert_eq!(
            serde_json::to_value(SubmitOutcome::Submitted).unwrap(),
            json!({"status": "submitted"})
        );
    }
}
