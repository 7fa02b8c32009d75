//! # Bounded channel: non-blocking producers, waiting consumers.
//!
//! [`BoundedChannel`] is a cloneable handle to a shared, fixed-capacity FIFO.
//!
//! ## Architecture
//! ```text
//! Producers (many):                          Consumers (one or more):
//!   offer(a) ──┐        ┌──────────────────┐
//!   offer(b) ──┼──────► │ Mutex<VecDeque>  │ ──► take(timeout) / recv()
//!   offer(c) ──┘   ▲    │  len <= capacity │          ▲
//!                  │    └──────────────────┘          │
//!           Full/Closed          │                    │
//!         (item handed back)     └── Notify ──────────┘
//!                                   notify_one on offer
//!                                   notify_waiters on close
//! ```
//!
//! ## Rules
//! - **Non-blocking offer**: `offer()` never suspends; a full channel rejects.
//! - **Linearizable admission**: the length check and the push happen under
//!   one lock, so `capacity` concurrent offers into an empty channel all
//!   succeed and every further one is rejected.
//! - **FIFO**: items are taken in the order their offers were accepted.
//! - **Single delivery**: each item is popped under the lock by exactly one taker.
//! - **Close**: wakes every pending taker; afterwards `offer` and `take` fail.
//!   Items still buffered stay there until [`BoundedChannel::drain`].
//!
//! ## Fault safety
//! The lock is a `parking_lot::Mutex` (no poisoning). It is only held for
//! plain `VecDeque` operations, never across an `.await` or user code, so a
//! panicking producer cannot leave it held or half-updated.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time;

use crate::error::{OfferError, TakeError};

struct State<T> {
    buf: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    notify: Notify,
}

/// Fixed-capacity FIFO with non-blocking `offer` and waiting `take`.
///
/// Cloning is cheap and yields another handle to the **same** channel.
/// Dropping a handle never closes the channel; call [`close`](Self::close).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use idlevisor::{BoundedChannel, OfferError, TakeError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ch = BoundedChannel::new(2);
/// assert!(ch.offer("a").is_ok());
/// assert!(ch.offer("b").is_ok());
/// assert_eq!(ch.offer("c"), Err(OfferError::Full("c")));
///
/// assert_eq!(ch.take(Duration::from_millis(10)).await, Ok("a"));
/// assert_eq!(ch.take(Duration::ZERO).await, Ok("b"));
/// assert_eq!(ch.take(Duration::ZERO).await, Err(TakeError::Timeout));
/// # }
/// ```
pub struct BoundedChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.state.lock();
        f.debug_struct("BoundedChannel")
            .field("capacity", &self.shared.capacity)
            .field("len", &st.buf.len())
            .field("closed", &st.closed)
            .finish()
    }
}

impl<T> BoundedChannel<T> {
    /// Creates an empty channel holding at most `capacity` items.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    buf: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                capacity,
                notify: Notify::new(),
            }),
        }
    }

    /// Attempts to append `item` without waiting.
    ///
    /// - `Ok(())`: the item was queued and one waiting consumer was woken.
    /// - `Err(OfferError::Full(item))`: all slots are taken.
    /// - `Err(OfferError::Closed(item))`: the channel is closed.
    ///
    /// Rejection is an ordinary outcome; the item is handed back untouched.
    pub fn offer(&self, item: T) -> Result<(), OfferError<T>> {
        {
            let mut st = self.shared.state.lock();
            if st.closed {
                return Err(OfferError::Closed(item));
            }
            if st.buf.len() >= self.shared.capacity {
                return Err(OfferError::Full(item));
            }
            st.buf.push_back(item);
        }
        self.shared.notify.notify_one();
        Ok(())
    }

    /// Takes the oldest item if one is queued right now.
    ///
    /// Returns `Err(TakeError::Timeout)` when empty (a zero-length wait) and
    /// `Err(TakeError::Closed)` once closed.
    pub fn try_take(&self) -> Result<T, TakeError> {
        let mut st = self.shared.state.lock();
        if st.closed {
            return Err(TakeError::Closed);
        }
        st.buf.pop_front().ok_or(TakeError::Timeout)
    }

    /// Waits up to `timeout` for the oldest item.
    ///
    /// A zero `timeout` is an immediate poll (see [`try_take`](Self::try_take)).
    /// On timeout nothing is consumed.
    pub async fn take(&self, timeout: Duration) -> Result<T, TakeError> {
        if timeout.is_zero() {
            return self.try_take();
        }
        match time::timeout(timeout, self.wait_item()).await {
            Ok(res) => res,
            Err(_elapsed) => Err(TakeError::Timeout),
        }
    }

    /// Waits without a deadline for the oldest item.
    ///
    /// Returns `None` once the channel is closed.
    pub async fn recv(&self) -> Option<T> {
        self.wait_item().await.ok()
    }

    /// Cooperative-yield fallback for `take`.
    ///
    /// Polls the buffer, yielding to the scheduler with
    /// [`tokio::task::yield_now`] between attempts, at most `max_spins` times.
    /// This keeps the calling task runnable the whole time, so prefer
    /// [`take`](Self::take) or [`recv`](Self::recv); use this only where a
    /// timer-backed wait is unavailable and the expected wait is a handful of
    /// scheduler turns.
    pub async fn take_spinning(&self, max_spins: usize) -> Result<T, TakeError> {
        let mut spins = 0;
        loop {
            match self.try_take() {
                Err(TakeError::Timeout) if spins < max_spins => {
                    spins += 1;
                    tokio::task::yield_now().await;
                }
                res => return res,
            }
        }
    }

    /// Closes the channel permanently and wakes every pending taker.
    ///
    /// Idempotent: returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let newly_closed = {
            let mut st = self.shared.state.lock();
            !std::mem::replace(&mut st.closed, true)
        };
        if newly_closed {
            self.shared.notify.notify_waiters();
        }
        newly_closed
    }

    /// Takes the oldest item, or closes the channel if nothing is queued.
    ///
    /// Both happen under one lock, so an offer either lands before this call
    /// (and is returned) or is rejected with `OfferError::Closed`. Returns
    /// `None` when the channel was sealed or was already closed.
    pub(crate) fn take_or_close(&self) -> Option<T> {
        {
            let mut st = self.shared.state.lock();
            if st.closed {
                return None;
            }
            if let Some(item) = st.buf.pop_front() {
                return Some(item);
            }
            st.closed = true;
        }
        self.shared.notify.notify_waiters();
        None
    }

    /// Removes and returns every item still buffered, oldest first.
    ///
    /// Typically called after [`close`](Self::close) so that accepted items
    /// are accounted for rather than silently dropped.
    pub fn drain(&self) -> Vec<T> {
        self.shared.state.lock().buf.drain(..).collect()
    }

    /// Number of items currently buffered.
    pub fn len(&self) -> usize {
        self.shared.state.lock().buf.len()
    }

    /// `true` if no items are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if every slot is taken.
    pub fn is_full(&self) -> bool {
        self.len() >= self.shared.capacity
    }

    /// Maximum number of buffered items.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// `true` once [`close`](Self::close) has been called on any handle.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    async fn wait_item(&self) -> Result<T, TakeError> {
        loop {
            // Register interest before checking, so an offer or close that
            // lands between the check and the await still wakes us.
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut st = self.shared.state.lock();
                if st.closed {
                    return Err(TakeError::Closed);
                }
                if let Some(item) = st.buf.pop_front() {
                    let more = !st.buf.is_empty();
                    drop(st);
                    if more {
                        self.shared.notify.notify_one();
                    }
                    return Ok(item);
                }
            }

            notified.await;
        }
    }
}
