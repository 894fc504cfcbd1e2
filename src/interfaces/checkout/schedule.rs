//! Cancellable timers for the shopper-facing pages.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

/// A fixed-length countdown started at a known instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    deadline: Instant,
    duration: Duration,
}

impl Countdown {
    pub fn start(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            duration,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// `MM:SS` of the remaining time, rounded up to the second, or `EXPIRED`.
    pub fn label(&self) -> String {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return "EXPIRED".to_string();
        }
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// A background task bounded by a countdown.
///
/// The task receives the countdown it runs under and is expected to finish
/// by its deadline. `stop` aborts it wherever it is.
pub struct ScheduledTask<T> {
    handle: JoinHandle<T>,
    countdown: Countdown,
}

impl<T: Send + 'static> ScheduledTask<T> {
    pub fn start<F, Fut>(lifetime: Duration, task: F) -> Self
    where
        F: FnOnce(Countdown) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let countdown = Countdown::start(lifetime);
        Self {
            handle: tokio::spawn(task(countdown)),
            countdown,
        }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    pub fn remaining(&self) -> Duration {
        self.countdown.remaining()
    }

    /// Waits for the task. `None` if it was stopped or panicked.
    pub async fn join(self) -> Option<T> {
        match self.handle.await {
            Ok(value) => Some(value),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                warn!(error = %e, "scheduled task panicked");
                None
            }
        }
    }
}
