//! Deadline scopes.
//!
//! # Responsibilities
//! - Bound every blocking network/storage operation by an explicit budget
//! - Carry an optional cancellation signal inherited from the caller
//! - Cancel operations cleanly on expiry (the wrapped future is dropped)
//!
//! # Design Decisions
//! - A scope is a plain value: start instant + budget + cancel signal
//! - Scopes never derive their budget from another scope's remaining time;
//!   only the cancel signal is inherited, and only when asked for
//! - Expiry by timer and expiry by caller cancellation are distinct errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a scope stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScopeExpired {
    /// The scope's own timer fired.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The inherited cancellation signal fired.
    #[error("cancelled by caller")]
    Cancelled,
}

/// Observer side of a cancellation signal.
///
/// A signal without a sender never fires.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Check whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once the signal fires. Pends forever for `never()`.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };

        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                if *rx.borrow() {
                    return;
                }
                return std::future::pending().await;
            }
        }
    }
}

/// Owner side of a cancellation signal. Fires on `cancel()` or on drop.
///
/// Handlers hold one for the lifetime of the inbound request: when the
/// caller disconnects the handler future is dropped, and so is the guard.
#[derive(Debug)]
pub struct CancelGuard {
    tx: watch::Sender<bool>,
}

impl CancelGuard {
    /// Create a guard and the signal it controls.
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx: Some(rx) })
    }

    /// Fire the signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

/// A bound on how long an operation may wait.
#[derive(Debug, Clone)]
pub struct DeadlineScope {
    started: Instant,
    budget: Duration,
    cancel: CancelSignal,
}

impl DeadlineScope {
    /// A fresh scope whose clock starts now and that nothing else can cancel.
    pub fn new(budget: Duration) -> Self {
        Self::with_cancel(budget, CancelSignal::never())
    }

    /// A fresh scope whose clock starts now, additionally ended early by
    /// `cancel`. Whichever fires first wins.
    pub fn with_cancel(budget: Duration, cancel: CancelSignal) -> Self {
        Self {
            started: Instant::now(),
            budget,
            cancel,
        }
    }

    /// Total budget of this scope.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Absolute expiry instant.
    pub fn deadline(&self) -> Instant {
        self.started + self.budget
    }

    /// Time spent since the scope was opened.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the timer fires (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.deadline().saturating_duration_since(Instant::now())
    }

    /// Check the scope without waiting.
    pub fn check(&self) -> Result<(), ScopeExpired> {
        if self.cancel.is_cancelled() {
            return Err(ScopeExpired::Cancelled);
        }
        if Instant::now() >= self.deadline() {
            return Err(ScopeExpired::DeadlineExceeded(self.budget));
        }
        Ok(())
    }

    /// Whether the scope has already ended, by timer or by cancellation.
    pub fn is_expired(&self) -> bool {
        self.check().is_err()
    }

    /// Drive `fut` until it completes or the scope ends.
    ///
    /// On expiry `fut` is dropped, which aborts any I/O it owns.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ScopeExpired>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScopeExpired::Cancelled),
            _ = tokio::time::sleep_until(self.deadline()) => {
                Err(ScopeExpired::DeadlineExceeded(self.budget))
            }
            output = fut => Ok(output),
        }
    }
}
