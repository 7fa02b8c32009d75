//! # Feed: a producer's view of the supervised channel.
//!
//! [`Feed`] wraps a [`BoundedChannel`] handle for one named producer. Offers go
//! straight to the channel; rejections are counted and published as
//! [`EventKind::OfferRejected`] so producers can simply drop them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::channel::BoundedChannel;
use crate::error::OfferError;
use crate::events::{Bus, Event, EventKind};

/// Offer counters shared by every feed of one run.
#[derive(Debug, Default)]
pub(crate) struct FeedStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl FeedStats {
    pub(crate) fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub(crate) fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Producer-side handle to the supervised channel.
pub struct Feed<T> {
    channel: BoundedChannel<T>,
    producer: Arc<str>,
    stats: Arc<FeedStats>,
    bus: Bus,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            producer: Arc::clone(&self.producer),
            stats: Arc::clone(&self.stats),
            bus: self.bus.clone(),
        }
    }
}

impl<T> Feed<T> {
    pub(crate) fn new(
        channel: BoundedChannel<T>,
        producer: impl Into<Arc<str>>,
        stats: Arc<FeedStats>,
        bus: Bus,
    ) -> Self {
        Self {
            channel,
            producer: producer.into(),
            stats,
            bus,
        }
    }

    /// Offers `item` without waiting (see [`BoundedChannel::offer`]).
    pub fn offer(&self, item: T) -> Result<(), OfferError<T>> {
        match self.channel.offer(item) {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                self.bus.publish(
                    Event::new(EventKind::OfferRejected)
                        .with_source(Arc::clone(&self.producer))
                        .with_reason(e.as_label()),
                );
                Err(e)
            }
        }
    }

    /// `true` once the channel was closed; further offers will be rejected.
    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// `true` if an offer right now would be rejected as full.
    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    /// Name of the producer this feed belongs to.
    pub fn producer(&self) -> &str {
        &self.producer
    }
}
