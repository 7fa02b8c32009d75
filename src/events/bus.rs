//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so the loop, producer runners and
//! the supervisor can publish without ever waiting.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Listener (one):
//!   IdleLoop        ──┐
//!   producer runner ──┼──► Bus ──► Supervisor::subscriber_listener ──► SubscriberSet
//!   Feed (rejects)  ──┤
//!   Supervisor      ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks.
//! - One ring buffer of `capacity` events is shared by every receiver;
//!   receivers that fall behind observe `RecvError::Lagged(n)`.
//! - Events sent while nobody listens are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (an `Arc`-backed sender inside).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; the minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every active receiver (fire-and-forget).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events sent **after** this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
