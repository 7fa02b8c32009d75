//! Idle-timeout consumption.
//!
//! - [`timer`]: [`IdleTimer`], the reusable timer with stop / drain / arm and
//!   the combined `reset`;
//! - [`consumer`]: [`IdleLoop`], the single consumer that re-arms the timer on
//!   every delivery;
//! - [`report`]: [`StopReason`] and [`LoopReport`].

mod consumer;
mod report;
mod timer;

pub use consumer::IdleLoop;
pub use report::{LoopReport, StopReason};
pub use timer::IdleTimer;
