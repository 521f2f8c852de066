use std::time::Duration;

use tokio::time::Instant;

/// A single-slot, cancellable debounce deadline.
///
/// Arming replaces any pending deadline; there is never more than one.
#[derive(Debug, Clone)]
pub struct SaveTimer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl SaveTimer {
    /// Create an unarmed timer with the given quiet window.
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Schedule expiry one quiet window from now, discarding any earlier
    /// deadline.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Resolve once the deadline passes.  Never resolves while unarmed.
    ///
    /// Does not disarm; the caller cancels after acting on the expiry.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
