//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out that delivers events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! IdleLoop / producers ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                     │
//!                                                     ┌───────────────┼──────────┐
//!                                                     ▼               ▼          ▼
//!                                                 LogWriter        Metrics     Custom
//! ```
//!
//! Subscribers are attached with
//! [`SupervisorBuilder::with_subscriber`](crate::SupervisorBuilder::with_subscriber).
//! A slow or panicking subscriber never affects the loop or other subscribers.

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
