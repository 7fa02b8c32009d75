//! Termination report of the idle loop.

use std::fmt;
use std::time::Duration;

/// Why an [`IdleLoop`](crate::IdleLoop) stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// No item arrived within the idle window.
    IdleTimeout,
    /// The source channel was closed.
    SourceClosed,
    /// Cancellation was requested through the loop's token.
    Cancelled,
}

impl StopReason {
    /// Stable label for logs/metrics: `idle-timeout`, `source-closed`, `cancelled`.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopReason::IdleTimeout => "idle-timeout",
            StopReason::SourceClosed => "source-closed",
            StopReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Summary returned by [`IdleLoop::run`](crate::IdleLoop::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopReport {
    /// Terminal state of the loop.
    pub reason: StopReason,
    /// Number of items handed to the consumer.
    pub delivered: u64,
    /// Number of re-arms that had to drain an expiration which fired while
    /// an item was being delivered.
    pub stale_drained: u64,
    /// Time between the first arm and termination.
    pub elapsed: Duration,
}
