//! Cancellation and deadline carrier shared by every checker in a run
//!
//! A [`ProbeContext`] is cheap to clone; clones share the same cancellation
//! signal. Checkers call [`ProbeContext::err`] before any I/O and race their
//! I/O against [`ProbeContext::done`] so an expired or cancelled context makes
//! in-flight and not-yet-started checks fail fast.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct ProbeContext {
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl ProbeContext {
    /// Context that is never cancelled on its own and has no deadline
    pub fn background() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            cancel_tx: Arc::new(tx),
            cancel_rx: rx,
            deadline: None,
        }
    }

    /// Context expiring `timeout` from now
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        let mut ctx = Self::background();
        ctx.deadline = Some(deadline);
        ctx
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// `limit` shortened so it never outlives the context deadline
    pub fn bounded(&self, limit: Duration) -> Duration {
        match self.remaining() {
            Some(left) => limit.min(left),
            None => limit,
        }
    }

    /// Why the context is finished, or `None` while it is still live
    ///
    /// Cancellation wins over an expired deadline when both apply.
    pub fn err(&self) -> Option<ContextError> {
        if *self.cancel_rx.borrow() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) -> ContextError {
        let mut rx = self.cancel_rx.clone();
        let cancelled = async move {
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                // Sender gone: nobody can cancel any more
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = cancelled => ContextError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                cancelled.await;
                ContextError::Cancelled
            }
        }
    }
}

impl Default for ProbeContext {
    fn default() -> Self {
        Self::background()
    }
}
