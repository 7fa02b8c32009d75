//! # Producer abstractions.
//!
//! - [`Producer`] - trait for async cancelable item sources
//! - [`ProducerFn`] - closure-backed implementation
//! - [`ProducerRef`] - shared reference (`Arc<dyn Producer<T>>`)
//! - [`Feed`] - the producer's handle to the supervised channel

mod feed;
mod producer;
mod producer_fn;

pub(crate) use feed::FeedStats;
pub use feed::Feed;
pub use producer::{Producer, ProducerRef};
pub use producer_fn::ProducerFn;
