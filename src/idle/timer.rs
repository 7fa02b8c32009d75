//! # Reusable idle timer with an explicit drain-before-rearm contract.
//!
//! [`IdleTimer`] is a single-owner timer handle. It models the expiration as
//! a one-slot signal so that "fired but not yet observed" is an explicit state
//! instead of something callers have to remember.
//!
//! ## States
//! ```text
//!            arm(d)                 deadline passes / stop() too late
//!   Idle ───────────► Armed ─────────────────────────────────► Fired
//!    ▲                  │ stop() in time                          │
//!    │                  ▼                                         │
//!    └──────────────── Idle ◄──── drain() / expired() consumed ───┘
//! ```
//!
//! ## Rules
//! - At most **one** expiration signal is outstanding.
//! - `arm()` while `Fired` is rejected with [`TimerError::SignalPending`].
//! - [`IdleTimer::reset`] is the combined operation: stop, drain if stop came
//!   too late, arm a full window. It cannot leave a stale signal behind.

use std::fmt;
use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::{self, Instant, Sleep};

use crate::error::TimerError;

/// Cap for windows that overflow `Instant` (same horizon tokio uses).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Armed,
    Fired,
}

/// Single-owner idle timer.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use idlevisor::IdleTimer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut timer = IdleTimer::new();
/// timer.arm(Duration::from_millis(5)).unwrap();
/// timer.expired().await;
/// assert!(!timer.is_armed());
/// # }
/// ```
pub struct IdleTimer {
    // Created on the first arm, so a timer can be built outside a runtime.
    sleep: Option<Pin<Box<Sleep>>>,
    state: TimerState,
}

impl fmt::Debug for IdleTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleTimer")
            .field("state", &self.state)
            .field("deadline", &self.deadline())
            .finish()
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleTimer {
    /// Creates an unarmed timer.
    ///
    /// Does not touch the tokio timer driver; only [`arm`](Self::arm) and
    /// [`reset`](Self::reset) need a runtime.
    pub fn new() -> Self {
        Self {
            sleep: None,
            state: TimerState::Idle,
        }
    }

    /// Arms the timer to fire `window` from now.
    ///
    /// A window too large to represent (e.g. `Duration::MAX`) is capped at a
    /// deadline roughly 30 years out. Re-arming an armed timer moves its deadline. Fails with
    /// [`TimerError::SignalPending`] if an expiration is queued but undrained.
    pub fn arm(&mut self, window: Duration) -> Result<Instant, TimerError> {
        if self.state == TimerState::Fired {
            return Err(TimerError::SignalPending);
        }
        Ok(self.arm_unchecked(window))
    }

    /// Attempts to cancel the pending expiration.
    ///
    /// Returns `true` if an armed timer was stopped before its deadline.
    /// Returns `false` if it was not armed, or if the deadline had already
    /// passed; in the latter case the expiration stays queued until
    /// [`drain`](Self::drain) or [`expired`](Self::expired) consumes it.
    pub fn stop(&mut self) -> bool {
        match self.state {
            TimerState::Armed if Some(Instant::now()) < self.sleep_deadline() => {
                self.state = TimerState::Idle;
                true
            }
            TimerState::Armed => {
                self.state = TimerState::Fired;
                false
            }
            TimerState::Idle | TimerState::Fired => false,
        }
    }

    /// Discards a queued expiration without waiting.
    ///
    /// Returns `true` if a signal was discarded.
    pub fn drain(&mut self) -> bool {
        if self.state == TimerState::Fired {
            self.state = TimerState::Idle;
            true
        } else {
            false
        }
    }

    /// Stops the timer, drains a late expiration, and arms a fresh `window`.
    ///
    /// Returns `true` when a stale expiration had to be drained.
    pub fn reset(&mut self, window: Duration) -> bool {
        let drained = if self.stop() { false } else { self.drain() };
        self.arm_unchecked(window);
        drained
    }

    /// Completes when the timer expires, consuming the expiration.
    ///
    /// Resolves immediately with a queued signal; never resolves while the
    /// timer is unarmed. Cancel-safe: dropping the future keeps the timer armed.
    pub async fn expired(&mut self) -> Instant {
        poll_fn(|cx| self.poll_expired(cx)).await
    }

    /// Poll form of [`expired`](Self::expired).
    pub fn poll_expired(&mut self, cx: &mut Context<'_>) -> Poll<Instant> {
        match self.state {
            TimerState::Idle => Poll::Pending,
            TimerState::Fired => {
                self.state = TimerState::Idle;
                Poll::Ready(self.sleep_deadline().unwrap_or_else(Instant::now))
            }
            TimerState::Armed => {
                let Some(sleep) = self.sleep.as_mut() else {
                    return Poll::Pending;
                };
                match sleep.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        let deadline = sleep.deadline();
                        self.state = TimerState::Idle;
                        Poll::Ready(deadline)
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }

    /// Deadline of the armed timer, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        if self.state == TimerState::Armed {
            self.sleep_deadline()
        } else {
            None
        }
    }

    /// `true` while a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.state == TimerState::Armed
    }

    /// `true` while an expiration is queued but not yet consumed.
    pub fn has_pending_signal(&self) -> bool {
        self.state == TimerState::Fired
    }

    fn arm_unchecked(&mut self, window: Duration) -> Instant {
        let now = Instant::now();
        let deadline = now.checked_add(window).unwrap_or_else(|| now + FAR_FUTURE);
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(time::sleep_until(deadline))),
        }
        self.state = TimerState::Armed;
        deadline
    }

    fn sleep_deadline(&self) -> Option<Instant> {
        self.sleep.as_ref().map(|sleep| sleep.deadline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn expires_after_window() {
        let mut timer = IdleTimer::new();
        let start = Instant::now();
        let deadline = timer.arm(WINDOW).unwrap();

        let fired_at = timer.expired().await;
        assert_eq!(fired_at, deadline);
        assert!(start.elapsed() >= WINDOW);
        assert!(!timer.is_armed());
        assert!(!timer.has_pending_signal());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_in_time_cancels() {
        let mut timer = IdleTimer::new();
        timer.arm(WINDOW).unwrap();
        time::advance(Duration::from_millis(10)).await;

        assert!(timer.stop());
        assert!(!timer.drain());
        assert_eq!(timer.deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn late_stop_queues_a_signal_that_blocks_arm() {
        let mut timer = IdleTimer::new();
        timer.arm(WINDOW).unwrap();
        time::advance(WINDOW + Duration::from_millis(1)).await;

        assert!(!timer.stop());
        assert!(timer.has_pending_signal());
        assert_eq!(timer.arm(WINDOW), Err(TimerError::SignalPending));

        assert!(timer.drain());
        assert!(timer.arm(WINDOW).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drains_stale_signal_and_grants_full_window() {
        let mut timer = IdleTimer::new();
        timer.arm(WINDOW).unwrap();
        time::advance(WINDOW * 2).await;

        let rearmed_at = Instant::now();
        assert!(timer.reset(WINDOW));
        assert!(timer.is_armed());

        // The stale expiration must not surface as a new one.
        let fired_at = timer.expired().await;
        assert_eq!(fired_at, rearmed_at + WINDOW);
        assert!(Instant::now() >= rearmed_at + WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_before_deadline_reports_nothing_drained() {
        let mut timer = IdleTimer::new();
        timer.arm(WINDOW).unwrap();
        time::advance(Duration::from_millis(20)).await;
        assert!(!timer.reset(WINDOW));
    }

    #[tokio::test(start_paused = true)]
    async fn unarmed_timer_never_fires() {
        let mut timer = IdleTimer::new();
        let res = time::timeout(Duration::from_secs(3600), timer.expired()).await;
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn queued_signal_is_delivered_immediately() {
        let mut timer = IdleTimer::new();
        let deadline = timer.arm(WINDOW).unwrap();
        time::advance(WINDOW).await;
        assert!(!timer.stop());

        let before = Instant::now();
        assert_eq!(timer.expired().await, deadline);
        assert_eq!(Instant::now(), before);
        assert!(!timer.drain());
    }

    #[tokio::test(start_paused = true)]
    async fn huge_window_is_capped_instead_of_overflowing() {
        let mut timer = IdleTimer::new();
        let deadline = timer.arm(Duration::MAX).unwrap();
        assert!(deadline > Instant::now() + Duration::from_secs(86_400 * 365));
        assert!(timer.stop());

        assert!(!timer.reset(Duration::MAX));
        assert!(timer.is_armed());
    }

    #[test]
    fn construction_needs_no_runtime() {
        let mut timer = IdleTimer::new();
        assert!(!timer.is_armed());
        assert!(!timer.stop());
        assert_eq!(timer.deadline(), None);
    }
}
