//! Runtime core: producer supervision and shutdown.
//!
//! The public API from this module is [`Supervisor`] (with its builder),
//! [`Config`] and the run reports.
//!
//! Internal modules:
//! - [`runner`]: runs one producer with panic isolation and event publishing;
//! - [`supervisor`]: wires producers to the idle loop, handles signals and grace;
//! - [`shutdown`]: cross-platform termination signal handling;
//! - [`builder`]: assembles bus, subscribers and listener;
//! - [`config`]: runtime settings;
//! - [`report`]: run and producer outcomes.

mod builder;
mod config;
mod report;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use report::{ProducerOutcome, RunReport};
pub use supervisor::Supervisor;

pub(crate) use runner::panic_message;
