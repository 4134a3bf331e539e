use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default debounce window between the last mutation and the validator run.
pub const DEFAULT_VALIDATE_DEBOUNCE_MS: u64 = 300;

/// Runtime configuration for a [`Form`](crate::Form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Debounce window for scheduled validation in milliseconds.
    ///
    /// Bursts of mutations inside the window collapse into one validator run.
    pub validate_debounce_ms: u64,
    /// Whether [`Form::reinitialize`](crate::Form::reinitialize) may replace
    /// the initial values after construction.
    pub enable_reinitialize: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validate_debounce_ms: DEFAULT_VALIDATE_DEBOUNCE_MS,
            enable_reinitialize: false,
        }
    }
}

impl FormConfig {
    /// Set the validation debounce window.
    #[must_use]
    pub fn with_validate_debounce(mut self, debounce: Duration) -> Self {
        self.validate_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Allow or forbid reinitialization from new initial values.
    #[must_use]
    pub fn with_enable_reinitialize(mut self, enable: bool) -> Self {
        self.enable_reinitialize = enable;
        self
    }

    /// Debounce window as a [`Duration`].
    pub fn validate_debounce(&self) -> Duration {
        Duration::from_millis(self.validate_debounce_ms)
    }
}
