//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `IdleLoop`, the producer runner, `Feed` (rejected
//!   offers), `Supervisor`, `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: `Supervisor::subscriber_listener()`, which fans out to the
//!   `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
