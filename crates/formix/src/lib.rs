//! Form state management: values, field metadata, debounced validation and
//! submission.
//!
//! # Core Concepts
//!
//! - **Form**: owns the current values and the initial snapshot, tracks the
//!   registered fields and coordinates validation and submit
//! - **FieldHandle**: a registered field's value, error, touched and disabled
//!   state, plus setters
//! - **Validator**: turns a snapshot of the values into `{path, message}`
//!   issues; runs are debounced and never overlap
//! - **SubmitHandler**: receives the values of a valid form
//!
//! Values are plain `serde_json::Value` documents addressed by paths such as
//! `"items[0].name"` (see [`formix_state`]).
//!
//! # Quick Start
//!
//! ```
//! use formix::{validator_fn, Form, SubmitOutcome, ValidationIssue};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), formix::FormError> {
//! let validator = validator_fn(|values: Value| async move {
//!     let mut issues = Vec::new();
//!     if values["email"].as_str().unwrap_or("").is_empty() {
//!         issues.push(ValidationIssue::new("email", "required"));
//!     }
//!     Ok(issues)
//! });
//!
//! let form = Form::builder()
//!     .with_initial_values(json!({"email": ""}))
//!     .with_validator(Arc::new(validator))
//!     .build();
//! let email = form.register_field("email");
//!
//! let outcome = form.submit_form().await?;
//! assert!(matches!(outcome, SubmitOutcome::Invalid { .. }));
//! assert_eq!(email.error().as_deref(), Some("required"));
//!
//! email.set_value(json!("ada@example.com"));
//! assert!(form.submit_form().await?.is_submitted());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod form;
pub mod registry;
pub mod scheduler;
pub mod validator;

pub use config::{FormConfig, DEFAULT_VALIDATE_DEBOUNCE_MS};
pub use error::{FormError, FormResult};
pub use field::{ArrayFieldHandle, FieldHandle, FieldMeta};
pub use form::{Form, FormBuilder, SubmitOutcome};
pub use registry::{FieldEntry, FieldRegistry};
pub use scheduler::{ValidationPhase, ValidationScheduler, ValidationTarget};
pub use validator::{
    submit_fn, validator_fn, FnSubmitHandler, FnValidator, SubmitHandler, ValidationIssue,
    Validator,
};

pub use formix_state::{parse_path, Path, Seg, Value};
