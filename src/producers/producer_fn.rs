//! # Function-backed producer (`ProducerFn`)
//!
//! [`ProducerFn`] wraps a closure `F: Fn(Feed<T>, CancellationToken) -> Fut`,
//! producing a fresh future per run. Shared state, if any, goes in an
//! explicit `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use idlevisor::{Feed, ProducerFn, ProducerRef, TaskError};
//!
//! let p: ProducerRef<&'static str> =
//!     ProducerFn::arc("greeter", |feed: Feed<&'static str>, _ctx: CancellationToken| async move {
//!         let _ = feed.offer("hello");
//!         Ok::<_, TaskError>(())
//!     });
//!
//! assert_eq!(p.name(), "greeter");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::producers::feed::Feed;
use crate::producers::producer::Producer;

/// Function-backed producer.
#[derive(Debug)]
pub struct ProducerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ProducerFn<F> {
    /// Creates a new function-backed producer.
    ///
    /// Prefer [`ProducerFn::arc`] when you immediately need a
    /// [`ProducerRef`](crate::ProducerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the producer and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<T, F, Fut> Producer<T> for ProducerFn<F>
where
    T: Send + 'static,
    F: Fn(Feed<T>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, feed: Feed<T>, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(feed, ctx).await
    }
}
