//! Operation context: cancellation plus an optional deadline.
//!
//! Every façade call runs inside an [`OpContext`]. Store round-trips and
//! retry sleeps race against it, so cancelling the context (or letting its
//! deadline pass) ends the operation promptly.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context (or one of its ancestors) was cancelled.
    #[error("context cancelled")]
    Cancelled,
    /// The deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline for a single logical operation.
///
/// Cloning shares the same token; use [`OpContext::child`] to derive a
/// context that can be cancelled independently of its parent.
///
/// # Example
///
/// ```
/// use kit_cache::context::OpContext;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = OpContext::with_timeout(Duration::from_secs(2));
/// let child = ctx.child();
///
/// ctx.cancel();
/// assert!(child.is_done());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for OpContext {
    fn default() -> Self {
        Self::background()
    }
}

impl OpContext {
    /// Context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        OpContext {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Fresh context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        OpContext {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Derive a child: cancelled with the parent, cancellable on its own,
    /// and bound by the parent's deadline.
    pub fn child(&self) -> Self {
        OpContext {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child whose deadline is the earlier of the parent's and
    /// `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        OpContext {
            token: self.token.child_token(),
            deadline: Some(self.deadline.map_or(own, |d| d.min(own))),
        }
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Reason the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            Some(ContextError::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(ContextError::DeadlineExceeded)
        } else {
            None
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is done, yielding the reason.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => ContextError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Drive `fut` to completion unless the context finishes first.
    ///
    /// Cancellation wins ties: a future that is ready in the same poll as
    /// the cancellation is discarded.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ContextError> {
        if let Some(reason) = self.err() {
            return Err(reason);
        }
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            out = fut => Ok(out),
        }
    }

    /// Sleep for `delay`, waking early with an error if the context ends.
    pub async fn sleep(&self, delay: Duration) -> Result<(), ContextError> {
        self.run(tokio::time::sleep(delay)).await
    }
}
