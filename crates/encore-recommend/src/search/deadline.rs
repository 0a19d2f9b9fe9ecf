use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shareable cancellation flag for a recommendation running on another
/// thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Wall-clock budget for one recommendation call, checked cooperatively at
/// safe points. Expiry is never an error; engines return best-so-far.
#[derive(Debug, Clone)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
    cancel: Option<CancelToken>,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
            cancel: None,
        }
    }

    pub fn with_cancel(budget: Duration, cancel: CancelToken) -> Self {
        Self {
            start: Instant::now(),
            budget,
            cancel: Some(cancel),
        }
    }

    pub fn expired(&self) -> bool {
        if let Some(cancel) = &self.cancel {
            if cancel.is_cancelled() {
                return true;
            }
        }
        self.start.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}
