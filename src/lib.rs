//! # idlevisor
//!
//! **Idlevisor** is a small async toolkit built around a bounded channel and a
//! consumer loop that stops after a period of silence.
//!
//! - [`BoundedChannel`]: fixed-capacity FIFO with a **non-blocking** `offer`
//!   (the item is handed back when full) and a **blocking** `take` with an
//!   optional timeout.
//! - [`IdleTimer`] and [`IdleLoop`]: a one-shot idle deadline that is always
//!   drained before it is re-armed, so an expiration that fired while an item
//!   was being handled can never terminate the loop afterwards.
//! - [`Supervisor`]: runs fault-isolated [`Producer`]s against a fresh channel,
//!   feeds a single consumer through an [`IdleLoop`], reacts to OS signals and
//!   winds the producers down within a grace period.
//!
//! ## Architecture
//! ```text
//!     ┌────────────┐   ┌────────────┐   ┌────────────┐
//!     │ Producer#1 │   │ Producer#2 │   │ Producer#N │
//!     └─────┬──────┘   └─────┬──────┘   └─────┬──────┘
//!           │ Feed::offer    │                │     (never blocks; Full/Closed
//!           ▼                ▼                ▼      hands the item back)
//! ┌──────────────────────────────────────────────────────┐
//! │             BoundedChannel (capacity C)              │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ recv()
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │  IdleLoop                                            │
//! │   select (biased):                                   │
//! │     cancelled ─────────────────► Cancelled           │
//! │     item      ─► on_item(item) ─► IdleTimer::reset   │
//! │                                  (stop, drain, arm)  │
//! │     closed    ─────────────────► SourceClosed        │
//! │     expired   ─────────────────► IdleTimeout         │
//! └──────────────────────────┬───────────────────────────┘
//!                            ▼
//!            LoopReport { reason, delivered, .. }
//!
//! Events: IdleLoop / producers / Feed ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                    |
//! |-------------------|----------------------------------------------------------|---------------------------------------|
//! | **Channel**       | Bounded FIFO, non-blocking offer, blocking take.         | [`BoundedChannel`]                    |
//! | **Idle loop**     | Drain-before-rearm idle deadline and consumer loop.      | [`IdleTimer`], [`IdleLoop`]           |
//! | **Producers**     | Define producers as functions or trait objects.          | [`Producer`], [`ProducerFn`], [`Feed`]|
//! | **Supervision**   | Run producers and the loop, signals, grace shutdown.     | [`Supervisor`]                        |
//! | **Subscriber API**| Observe loop and producer events.                        | [`Subscribe`], [`Event`]              |
//! | **Errors**        | Typed errors for channel, timer and runtime.             | [`OfferError`], [`TakeError`], [`RuntimeError`] |
//! | **Configuration** | Centralize runtime settings.                             | [`Config`]                            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use idlevisor::{BoundedChannel, IdleLoop, OfferError, StopReason};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let ch = BoundedChannel::new(2);
//!     assert!(ch.offer("a").is_ok());
//!     assert!(ch.offer("b").is_ok());
//!     assert_eq!(ch.offer("c"), Err(OfferError::Full("c")));
//!
//!     let report = IdleLoop::new(ch.clone(), Duration::from_millis(10))
//!         .run(|item| async move { println!("got {item}") })
//!         .await;
//!
//!     assert_eq!(report.reason, StopReason::IdleTimeout);
//!     assert_eq!(report.delivered, 2);
//! }
//! ```

mod channel;
mod core;
mod error;
mod events;
mod idle;
mod producers;
mod subscribers;

// ---- Public re-exports ----

pub use channel::BoundedChannel;
pub use core::{Config, ProducerOutcome, RunReport, Supervisor, SupervisorBuilder};
pub use error::{OfferError, RuntimeError, TakeError, TaskError, TimerError};
pub use events::{Bus, Event, EventKind};
pub use idle::{IdleLoop, IdleTimer, LoopReport, StopReason};
pub use producers::{Feed, Producer, ProducerFn, ProducerRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
