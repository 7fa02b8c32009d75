//! # Producer abstraction.
//!
//! A [`Producer`] is an async, cancelable unit that feeds items into the
//! supervised channel through a [`Feed`]. The common handle type is
//! [`ProducerRef`], an `Arc<dyn Producer<T>>` suitable for sharing across the
//! runtime.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::producers::feed::Feed;

/// Shared handle to a producer.
pub type ProducerRef<T> = Arc<dyn Producer<T>>;

/// # Asynchronous, cancelable item source.
///
/// A producer has a stable [`name`](Producer::name) and an async
/// [`run`](Producer::run) method that receives a [`Feed`] and a
/// [`CancellationToken`]. It should exit promptly once the token is cancelled
/// or the feed reports the channel closed.
///
/// Panics inside `run` are caught by the runtime and reported as
/// [`TaskError::Panicked`]; they never take the process or the channel down.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use idlevisor::{Feed, Producer, TaskError};
///
/// struct Counter(u32);
///
/// #[async_trait]
/// impl Producer<u32> for Counter {
///     fn name(&self) -> &str { "counter" }
///
///     async fn run(&self, feed: Feed<u32>, ctx: CancellationToken) -> Result<(), TaskError> {
///         for i in 0..self.0 {
///             if ctx.is_cancelled() || feed.is_closed() {
///                 return Err(TaskError::Canceled);
///             }
///             let _ = feed.offer(i); // rejections are counted by the feed
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Producer<T: Send + 'static>: Send + Sync + 'static {
    /// Returns a stable, human-readable producer name.
    fn name(&self) -> &str;

    /// Produces items until done, cancelled, or the channel closes.
    async fn run(&self, feed: Feed<T>, ctx: CancellationToken) -> Result<(), TaskError>;
}
