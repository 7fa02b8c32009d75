//! # IdleLoop: single consumer with an idle deadline.
//!
//! Pulls items from a [`BoundedChannel`] and hands them to a consumer
//! callback until one of three things happens: no item arrives within the idle
//! window, the channel closes, or cancellation is requested.
//!
//! ## State machine
//! ```text
//!        ┌───────────────────────── delivery ──────────────────────────┐
//!        ▼                                                             │
//!     Armed ──► wait { cancel | channel | timer }                      │
//!        │            │           │        │                           │
//!        │            │           │        └──► expired: take_or_close │
//!        │            │           │              ├─ item ──► delivery ─┤
//!        │            │           │              └─ empty ─► Expired   │
//!        │            │           └─ closed ──► SourceClosed           │
//!        │            └────────────────────────► Stopped (cancelled)   │
//!        │                                                             │
//!        └─ item ──► Draining:                                         │
//!                      1. on_item(item).await                          │
//!                      2. timer.stop()                                 │
//!                      3. if stop was too late: timer.drain()          │
//!                      4. timer.arm(idle)  ────────────────────────────┘
//!                   (steps 2-4 are IdleTimer::reset)
//! ```
//!
//! ## Rules
//! - The wait is `biased`: cancellation first, then a queued item, then the
//!   timer. An item that is already queued when the deadline passes is still
//!   delivered and earns a fresh window.
//! - The idle window starts **after** the consumer callback returns.
//! - On expiry the loop takes a late item or seals the channel in one locked
//!   step. An offer racing the deadline is therefore delivered or rejected
//!   with `OfferError::Closed`, never accepted into a channel nobody reads.
//!   The loop never closes its source in any other case.
//! - Cancellation is cooperative: checked at every iteration boundary and at
//!   the wait point, never while `on_item` runs.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::channel::BoundedChannel;
use crate::events::{Bus, Event, EventKind};
use crate::idle::report::{LoopReport, StopReason};
use crate::idle::timer::IdleTimer;

enum Wake<T> {
    Item(T),
    Closed,
    Expired,
    Cancelled,
}

/// Consumer loop with idle-timeout lifecycle.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use idlevisor::{BoundedChannel, IdleLoop, StopReason};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ch = BoundedChannel::new(4);
/// ch.offer(1).unwrap();
/// ch.offer(2).unwrap();
///
/// let mut seen = Vec::new();
/// let report = IdleLoop::new(ch, Duration::from_millis(20))
///     .run(|n| {
///         seen.push(n);
///         async {}
///     })
///     .await;
///
/// assert_eq!(seen, vec![1, 2]);
/// assert_eq!(report.reason, StopReason::IdleTimeout);
/// # }
/// ```
pub struct IdleLoop<T> {
    source: BoundedChannel<T>,
    idle: Duration,
    timer: IdleTimer,
    token: CancellationToken,
    bus: Option<Bus>,
}

impl<T> IdleLoop<T> {
    /// Creates a loop over `source` that stops after `idle` without deliveries.
    pub fn new(source: BoundedChannel<T>, idle: Duration) -> Self {
        Self {
            source,
            idle,
            timer: IdleTimer::new(),
            token: CancellationToken::new(),
            bus: None,
        }
    }

    /// Uses `token` for external cancellation instead of a private one.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Publishes loop lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Token that cancels this loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Idle window granted after each delivery.
    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Runs until idle timeout, source close or cancellation.
    ///
    /// Each item is passed to `on_item`, whose future is awaited before the
    /// idle window is re-armed. The timer is released when this returns.
    pub async fn run<F, Fut>(mut self, mut on_item: F) -> LoopReport
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut delivered: u64 = 0;
        let mut stale_drained: u64 = 0;

        self.timer.reset(self.idle);
        self.publish(Event::new(EventKind::LoopStarted).with_idle(self.idle));

        let reason = loop {
            if self.token.is_cancelled() {
                break StopReason::Cancelled;
            }

            let wake = tokio::select! {
                biased;
                _ = self.token.cancelled() => Wake::Cancelled,
                item = self.source.recv() => match item {
                    Some(item) => Wake::Item(item),
                    None => Wake::Closed,
                },
                _ = self.timer.expired() => Wake::Expired,
            };

            let item = match wake {
                Wake::Item(item) => item,
                Wake::Closed => break StopReason::SourceClosed,
                // An offer that raced the deadline is either taken here or
                // rejected by the sealed channel; it is never left behind.
                Wake::Expired => match self.source.take_or_close() {
                    Some(item) => item,
                    None => break StopReason::IdleTimeout,
                },
                Wake::Cancelled => break StopReason::Cancelled,
            };

            on_item(item).await;
            delivered += 1;

            if self.timer.reset(self.idle) {
                stale_drained += 1;
                self.publish(Event::new(EventKind::StaleSignalDrained).with_delivered(delivered));
            }
            self.publish(Event::new(EventKind::ItemDelivered).with_delivered(delivered));
        };

        self.publish(
            Event::new(EventKind::LoopTerminated)
                .with_stop_reason(reason)
                .with_delivered(delivered),
        );

        LoopReport {
            reason,
            delivered,
            stale_drained,
            elapsed: started.elapsed(),
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OfferError;
    use tokio::time;

    const IDLE: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn silence_ends_with_idle_timeout() {
        let ch = BoundedChannel::<u32>::new(1);
        let report = IdleLoop::new(ch.clone(), IDLE).run(|_| async {}).await;

        assert_eq!(report.reason, StopReason::IdleTimeout);
        assert_eq!(report.delivered, 0);
        assert!(report.elapsed >= IDLE);
        assert!(report.elapsed < IDLE + Duration::from_millis(5));
        assert!(ch.is_closed());
        assert_eq!(ch.offer(1), Err(OfferError::Closed(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn steady_traffic_keeps_loop_alive() {
        let ch = BoundedChannel::new(4);
        let producer = ch.clone();
        tokio::spawn(async move {
            for i in 0..10 {
                producer.offer(i).unwrap();
                time::sleep(Duration::from_millis(30)).await;
            }
        });

        let mut seen = Vec::new();
        let report = IdleLoop::new(ch, IDLE)
            .run(|n| {
                seen.push(n);
                async {}
            })
            .await;

        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        assert_eq!(report.reason, StopReason::IdleTimeout);
        assert_eq!(report.stale_drained, 0);
        assert!(report.elapsed >= Duration::from_millis(9 * 30) + IDLE);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_passing_during_delivery_is_drained_not_reported() {
        let ch = BoundedChannel::new(2);
        let producer = ch.clone();
        tokio::spawn(async move {
            producer.offer("a").unwrap();
            time::sleep(Duration::from_millis(100)).await;
            producer.offer("b").unwrap();
        });

        let mut seen = Vec::new();
        let report = IdleLoop::new(ch, IDLE)
            .run(|s| {
                seen.push(s);
                // Slower than the idle window: the deadline passes mid-delivery.
                time::sleep(Duration::from_millis(80))
            })
            .await;

        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.stale_drained, 2);
        assert_eq!(report.reason, StopReason::IdleTimeout);
        assert!(report.elapsed >= Duration::from_millis(230));
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_source_is_distinct_from_idle() {
        let ch = BoundedChannel::<u8>::new(1);
        let closer = ch.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            closer.close();
        });

        let report = IdleLoop::new(ch, IDLE).run(|_| async {}).await;
        assert_eq!(report.reason, StopReason::SourceClosed);
        assert!(report.elapsed < IDLE);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop() {
        let ch = BoundedChannel::<u8>::new(1);
        let token = CancellationToken::new();
        let lp = IdleLoop::new(ch, Duration::from_secs(3600)).with_cancellation(token.clone());

        let handle = tokio::spawn(lp.run(|_| async {}));
        time::sleep(Duration::from_millis(5)).await;
        token.cancel();

        let report = handle.await.unwrap();
        assert_eq!(report.reason, StopReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_delivers_nothing() {
        let ch = BoundedChannel::new(1);
        ch.offer(1).unwrap();
        let lp = IdleLoop::new(ch.clone(), IDLE);
        lp.cancellation_token().cancel();

        let report = lp.run(|_| async {}).await;
        assert_eq!(report.reason, StopReason::Cancelled);
        assert_eq!(report.delivered, 0);
        assert_eq!(ch.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_lifecycle_events() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let ch = BoundedChannel::new(1);
        ch.offer(7).unwrap();

        IdleLoop::new(ch, IDLE)
            .with_bus(bus)
            .run(|_| async {})
            .await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::LoopStarted,
                EventKind::ItemDelivered,
                EventKind::LoopTerminated
            ]
        );
    }

    /// capacity 2, idle 50ms; offers at 0, 10 and 60ms.
    async fn race_offers_against_deadline(ch: BoundedChannel<&'static str>) -> bool {
        let start = Instant::now();
        ch.offer("A").unwrap();
        time::sleep_until(start + Duration::from_millis(10)).await;
        ch.offer("B").unwrap();
        time::sleep_until(start + Duration::from_millis(60)).await;
        ch.offer("C").is_ok()
    }

    #[tokio::test(start_paused = true)]
    async fn offer_racing_the_deadline_is_delivered_or_rejected() {
        let ch = BoundedChannel::new(2);
        let third = tokio::spawn(race_offers_against_deadline(ch.clone()));

        let mut seen = Vec::new();
        let report = IdleLoop::new(ch.clone(), IDLE)
            .run(|s| {
                seen.push(s);
                async {}
            })
            .await;
        let c_accepted = third.await.unwrap();

        assert_eq!(report.reason, StopReason::IdleTimeout);
        if c_accepted {
            assert_eq!(seen, vec!["A", "B", "C"]);
            assert!(report.elapsed >= Duration::from_millis(110));
        } else {
            assert_eq!(seen, vec!["A", "B"]);
            assert!(report.elapsed >= Duration::from_millis(60));
            assert!(report.elapsed < Duration::from_millis(70));
        }
        assert!(ch.drain().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn offer_racing_the_deadline_across_threads() {
        for _ in 0..10 {
            let ch = BoundedChannel::new(2);
            let third = tokio::spawn(race_offers_against_deadline(ch.clone()));

            let mut seen = Vec::new();
            let report = IdleLoop::new(ch.clone(), IDLE)
                .run(|s| {
                    seen.push(s);
                    async {}
                })
                .await;
            let c_accepted = third.await.unwrap();

            assert_eq!(report.reason, StopReason::IdleTimeout);
            if c_accepted {
                assert_eq!(seen, vec!["A", "B", "C"]);
            } else {
                assert_eq!(seen, vec!["A", "B"]);
            }
            assert!(ch.drain().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_idle_window_does_not_overflow() {
        let ch = BoundedChannel::new(1);
        ch.offer(1).unwrap();
        let closer = ch.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            closer.close();
        });

        let report = IdleLoop::new(ch, Duration::MAX).run(|_| async {}).await;
        assert_eq!(report.reason, StopReason::SourceClosed);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn loop_can_be_built_outside_a_runtime() {
        let ch = BoundedChannel::<u8>::new(1);
        let lp = IdleLoop::new(ch.clone(), IDLE);
        ch.close();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let report = rt.block_on(lp.run(|_| async {}));
        assert_eq!(report.reason, StopReason::SourceClosed);
    }
}
