//! Debounced, serialized validation runs.
//!
//! `enqueue` arms a cancellable timer; every new request cancels the armed
//! one, so a burst of mutations produces a single validator call once the
//! burst settles. Runs hold a shared run lock, so the validator is never
//! invoked concurrently with itself: a timer that fires while a run is in
//! flight waits for it to finish and then validates the values current at
//! that moment.

use crate::error::FormResult;
use crate::validator::{ValidationIssue, Validator};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The document a scheduler validates.
pub trait ValidationTarget: Send + Sync + 'static {
    /// Snapshot of the values as they are right now.
    fn snapshot(&self) -> Value;

    /// Reconcile a resolved validation result onto the fields.
    fn apply_issues(&self, issues: &[ValidationIssue]);
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationPhase {
    /// Nothing scheduled or running.
    Idle,
    /// A debounce timer is armed.
    Pending,
    /// A validator call is in flight or waiting for the previous one.
    Running,
}

/// Debounces validation requests and serializes validator calls.
pub struct ValidationScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    validator: Mutex<Option<Arc<dyn Validator>>>,
    debounce: Mutex<Duration>,
    pending: Mutex<Option<CancellationToken>>,
    run_lock: tokio::sync::Mutex<()>,
    active: AtomicUsize,
    invocations: AtomicU64,
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Marks a run as active until dropped, on every exit path.
struct ActiveRun<'a>(&'a AtomicUsize);

impl<'a> ActiveRun<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ValidationScheduler {
    /// Create a scheduler. Without a validator every request is a no-op.
    pub fn new(validator: Option<Arc<dyn Validator>>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                validator: Mutex::new(validator),
                debounce: Mutex::new(debounce),
                pending: Mutex::new(None),
                run_lock: tokio::sync::Mutex::new(()),
                active: AtomicUsize::new(0),
                invocations: AtomicU64::new(0),
            }),
        }
    }

    /// Whether a validator is installed.
    pub fn has_validator(&self) -> bool {
        self.inner.validator().is_some()
    }

    /// Install or remove the validator.
    ///
    /// Runs that have not started yet use the new validator; a run already
    /// calling the old one finishes with it.
    pub fn set_validator(&self, validator: Option<Arc<dyn Validator>>) {
        *mutex_lock(&self.inner.validator) = validator;
    }

    /// Current debounce window.
    pub fn debounce(&self) -> Duration {
        *mutex_lock(&self.inner.debounce)
    }

    /// Change the debounce window. Applies to requests enqueued afterwards.
    pub fn set_debounce(&self, debounce: Duration) {
        *mutex_lock(&self.inner.debounce) = debounce;
    }

    /// `Running` while a validator call is in flight, `Pending` while a timer is armed.
    pub fn phase(&self) -> ValidationPhase {
        if self.inner.active.load(Ordering::SeqCst) > 0 {
            ValidationPhase::Running
        } else if mutex_lock(&self.inner.pending).is_some() {
            ValidationPhase::Pending
        } else {
            ValidationPhase::Idle
        }
    }

    /// Number of validator calls made so far.
    pub fn invocations(&self) -> u64 {
        self.inner.invocations.load(Ordering::SeqCst)
    }

    /// Request a validation pass after the debounce window.
    ///
    /// Re-arms the timer if one is pending. The timer task only holds a weak
    /// reference to `target`; if the target is gone when it fires, nothing
    /// runs. Faults of scheduled runs have no caller to report to and are
    /// logged.
    ///
    /// Must be called from within a tokio runtime; otherwise the request is
    /// dropped with a warning.
    pub fn enqueue<T: ValidationTarget>(&self, target: &Arc<T>) {
        if !self.has_validator() {
            return;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("no tokio runtime available; scheduled validation dropped");
                return;
            }
        };

        let token = CancellationToken::new();
        if let Some(previous) = mutex_lock(&self.inner.pending).replace(token.clone()) {
            previous.cancel();
        }
        let debounce = self.debounce();
        tracing::debug!(debounce_ms = debounce.as_millis() as u64, "validation enqueued");

        let inner = Arc::clone(&self.inner);
        let target = Arc::downgrade(target);
        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }
            let Some(_active) = inner.take_pending(&token) else {
                return;
            };
            let Some(target) = target.upgrade() else {
                return;
            };
            if let Err(e) = inner.run(target.as_ref()).await {
                tracing::warn!(error = %e, "scheduled validation failed");
            }
        });
    }

    /// Validate immediately, bypassing the debounce window.
    ///
    /// Cancels an armed timer and waits for any in-flight run before calling
    /// the validator. Validator faults are returned; field errors are left
    /// untouched in that case.
    pub async fn run_now<T: ValidationTarget + ?Sized>(&self, target: &T) -> FormResult<()> {
        if !self.has_validator() {
            return Ok(());
        }
        if let Some(pending) = mutex_lock(&self.inner.pending).take() {
            pending.cancel();
        }
        let _active = ActiveRun::enter(&self.inner.active);
        self.inner.run(target).await
    }
}

impl SchedulerInner {
    fn validator(&self) -> Option<Arc<dyn Validator>> {
        mutex_lock(&self.validator).clone()
    }

    /// Claim the pending slot for a fired timer. Returns `None` if the timer
    /// was superseded in the meantime.
    fn take_pending(&self, token: &CancellationToken) -> Option<ActiveRun<'_>> {
        let mut pending = mutex_lock(&self.pending);
        if token.is_cancelled() {
            return None;
        }
        *pending = None;
        Some(ActiveRun::enter(&self.active))
    }

    async fn run<T: ValidationTarget + ?Sized>(&self, target: &T) -> FormResult<()> {
        let _serial = self.run_lock.lock().await;
        // Resolved under the run lock so a swap lands on the next run.
        let Some(validator) = self.validator() else {
            return Ok(());
        };
        let values = target.snapshot();
        self.invocations.fetch_add(1, Ordering::SeqCst);

        let issues = validator.validate(&values).await?;
        tracing::debug!(issues = issues.len(), "validation resolved");
        target.apply_issues(&issues);
        Ok(())
    }
}

impl Drop for ValidationScheduler {
    fn drop(&mut self) {
        if let Some(pending) = mutex_lock(&self.inner.pending).take() {
            pending.cancel();
        }
    }
}

impl std::fmt::Debug for ValidationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationScheduler")
            .field("validator", &self.inner.validator().map(|_| "<set>"))
            .field("debounce", &self.debounce())
            .field("phase", &self.phase())
            .finish()
    }
}
