//! # Runtime events emitted by the consumer loop, producers and the supervisor.
//!
//! The [`EventKind`] enum classifies event types across four groups:
//! - **Loop events**: the idle loop's lifecycle (started, delivery, stale drain, terminated)
//! - **Producer events**: producer task lifecycle and rejected offers
//! - **Shutdown events**: signal handling and the producer grace window
//! - **Subscriber events**: overflow/panic inside the subscriber fan-out
//!
//! The [`Event`] struct carries the metadata: timestamps, source name,
//! reasons, counters.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use idlevisor::{Event, EventKind, StopReason};
//!
//! let ev = Event::new(EventKind::LoopTerminated)
//!     .with_stop_reason(StopReason::IdleTimeout)
//!     .with_delivered(3)
//!     .with_idle(Duration::from_millis(50));
//!
//! assert_eq!(ev.kind, EventKind::LoopTerminated);
//! assert_eq!(ev.stop_reason, Some(StopReason::IdleTimeout));
//! assert_eq!(ev.idle_ms, Some(50));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::idle::StopReason;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Loop events ===
    /// Consumer loop armed its first idle window.
    ///
    /// Sets: `idle_ms`
    LoopStarted,

    /// An item was handed to the consumer and the idle window re-armed.
    ///
    /// Sets: `delivered` (running total)
    ItemDelivered,

    /// The idle deadline passed while an item was being delivered; the stale
    /// expiration was drained before re-arming.
    ///
    /// Sets: `delivered`
    StaleSignalDrained,

    /// Consumer loop finished.
    ///
    /// Sets: `stop_reason`, `delivered`, `reason` (label of the stop reason)
    LoopTerminated,

    // === Producer events ===
    /// Producer task is starting.
    ///
    /// Sets: `source`
    ProducerStarting,

    /// Producer finished successfully or exited on cancellation.
    ///
    /// Sets: `source`
    ProducerStopped,

    /// Producer returned an error or panicked (contained at its boundary).
    ///
    /// Sets: `source`, `reason`
    ProducerFailed,

    /// An offer was rejected (full or closed).
    ///
    /// Sets: `source`, `reason` (`offer_full` / `offer_closed`)
    OfferRejected,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// Every producer stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some producers did not stop in time.
    ///
    /// Sets: `reason` (stuck producer names)
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `source` (subscriber name), `reason` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `source` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Producer or subscriber name, if applicable.
    pub source: Option<Arc<str>>,
    /// Human-readable reason (errors, labels, overflow details).
    pub reason: Option<Arc<str>>,
    /// Items delivered by the loop so far.
    pub delivered: Option<u64>,
    /// Idle window in milliseconds (compact).
    pub idle_ms: Option<u32>,
    /// Why the loop stopped (only for `LoopTerminated`).
    pub stop_reason: Option<StopReason>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            reason: None,
            delivered: None,
            idle_ms: None,
            stop_reason: None,
        }
    }

    /// Attaches a producer/subscriber name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the running delivery count.
    #[inline]
    pub fn with_delivered(mut self, n: u64) -> Self {
        self.delivered = Some(n);
        self
    }

    /// Attaches the idle window (stored as milliseconds).
    #[inline]
    pub fn with_idle(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.idle_ms = Some(ms);
        self
    }

    /// Attaches the loop stop reason; also sets `reason` to its label.
    #[inline]
    pub fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = Some(reason);
        self.reason = Some(Arc::from(reason.as_label()));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::LoopStarted);
        let b = Event::new(EventKind::ItemDelivered);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn stop_reason_sets_label() {
        let ev = Event::new(EventKind::LoopTerminated).with_stop_reason(StopReason::SourceClosed);
        assert_eq!(ev.reason.as_deref(), Some("source-closed"));
    }

    #[test]
    fn idle_window_saturates() {
        let ev = Event::new(EventKind::LoopStarted).with_idle(Duration::from_secs(u64::MAX));
        assert_eq!(ev.idle_ms, Some(u32::MAX));
    }
}
