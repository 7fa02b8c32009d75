//! Error types used by the channel, the idle timer, producers and the runtime.
//!
//! - [`OfferError`]: a non-blocking offer was rejected (the item is handed back).
//! - [`TakeError`]: a take returned without an item.
//! - [`TimerError`]: the idle timer was misused.
//! - [`TaskError`]: outcome of a producer task.
//! - [`RuntimeError`]: failures of the supervising runtime itself.
//!
//! Rejections and timeouts are ordinary outcomes and are returned as values.
//! Every enum provides `as_label` (stable snake_case, for logs/metrics).

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// # Rejected offer.
///
/// The rejected item is always returned to the caller, who decides whether to
/// drop it, count it or retry later.
#[derive(Error, PartialEq, Eq)]
pub enum OfferError<T> {
    /// All `capacity` slots are taken.
    #[error("channel full")]
    Full(T),
    /// The channel was closed.
    #[error("channel closed")]
    Closed(T),
}

impl<T> OfferError<T> {
    /// Returns the rejected item.
    pub fn into_inner(self) -> T {
        match self {
            OfferError::Full(item) | OfferError::Closed(item) => item,
        }
    }

    /// `true` when the rejection was caused by a full buffer.
    pub fn is_full(&self) -> bool {
        matches!(self, OfferError::Full(_))
    }

    /// `true` when the rejection was caused by a closed channel.
    pub fn is_closed(&self) -> bool {
        matches!(self, OfferError::Closed(_))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use idlevisor::OfferError;
    ///
    /// let err = OfferError::Full("item");
    /// assert_eq!(err.as_label(), "offer_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OfferError::Full(_) => "offer_full",
            OfferError::Closed(_) => "offer_closed",
        }
    }
}

impl<T> fmt::Debug for OfferError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferError::Full(_) => f.write_str("Full(..)"),
            OfferError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

/// # Take returned without an item.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// Nothing arrived before the timeout; nothing was consumed.
    #[error("timed out waiting for an item")]
    Timeout,
    /// The channel is closed.
    #[error("channel closed")]
    Closed,
}

impl TakeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TakeError::Timeout => "take_timeout",
            TakeError::Closed => "take_closed",
        }
    }
}

/// # Idle timer misuse.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// `arm` was called while an expiration signal is still queued.
    ///
    /// The signal has to be drained first (or use `IdleTimer::reset`).
    #[error("cannot arm: an undelivered expiration signal is pending")]
    SignalPending,
}

impl TimerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TimerError::SignalPending => "timer_signal_pending",
        }
    }
}

/// # Errors produced by the supervising runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Producers did not stop within the grace period after the loop ended.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the producers that were still running.
        stuck: Vec<String>,
    },

    /// The consumer loop task did not return normally (panicked or aborted).
    #[error("consumer loop aborted: {reason}")]
    LoopAborted {
        /// Panic message or abort reason.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use idlevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::LoopAborted { .. } => "runtime_loop_aborted",
        }
    }
}

/// # Outcome of a failed producer.
///
/// Producers return these from [`Producer::run`](crate::Producer::run); a
/// panic inside a producer is caught at the task boundary and reported as
/// [`TaskError::Panicked`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Producer failed with a recoverable error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Producer failed with a non-recoverable error.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Producer panicked; the panic was contained at its task boundary.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Producer observed cancellation and exited.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use idlevisor::TaskError;
    ///
    /// let err = TaskError::Panicked { info: "boom".into() };
    /// assert_eq!(err.as_label(), "task_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Indicates a fault (anything except a graceful cancellation).
    pub fn is_fault(&self) -> bool {
        !matches!(self, TaskError::Canceled)
    }
}
