//! # Run one producer with fault isolation.
//!
//! Executes a [`Producer`] to completion and publishes its lifecycle events.
//!
//! ## Event flow
//! ```text
//! publish ProducerStarting
//!   producer.run(feed, token)
//!     ├─ Ok(())            → publish ProducerStopped
//!     ├─ Err(Canceled)     → publish ProducerStopped (graceful exit)
//!     ├─ Err(Fail/Fatal)   → publish ProducerFailed
//!     └─ panic             → caught here → TaskError::Panicked → publish ProducerFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event.
//! - A panic never escapes the task boundary. The channel's lock is never
//!   held while producer code runs, so it cannot be left locked by the unwind.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::report::ProducerOutcome;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::producers::{Feed, ProducerRef};

/// Runs `producer` once and converts every way it can end into a value.
pub(crate) async fn run_producer<T: Send + 'static>(
    producer: ProducerRef<T>,
    feed: Feed<T>,
    token: CancellationToken,
    bus: Bus,
) -> ProducerOutcome {
    let name = producer.name().to_string();
    bus.publish(Event::new(EventKind::ProducerStarting).with_source(name.as_str()));

    let result = match AssertUnwindSafe(producer.run(feed, token)).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(TaskError::Panicked {
            info: panic_message(payload.as_ref()),
        }),
    };

    match &result {
        Ok(()) | Err(TaskError::Canceled) => {
            bus.publish(Event::new(EventKind::ProducerStopped).with_source(name.as_str()));
        }
        Err(e) => {
            bus.publish(
                Event::new(EventKind::ProducerFailed)
                    .with_source(name.as_str())
                    .with_reason(e.to_string()),
            );
        }
    }

    ProducerOutcome { name, result }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::channel::BoundedChannel;
    use crate::producers::{FeedStats, ProducerFn};

    fn feed(ch: &BoundedChannel<u32>, bus: &Bus) -> Feed<u32> {
        Feed::new(ch.clone(), "p", Arc::new(FeedStats::default()), bus.clone())
    }

    #[tokio::test]
    async fn panic_is_converted_into_a_failure_value() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let ch = BoundedChannel::new(2);

        let p: ProducerRef<u32> = ProducerFn::arc("p", |feed: Feed<u32>, _ctx: CancellationToken| async move {
            let _ = feed.offer(1);
            if feed.producer() == "p" {
                panic!("boom");
            }
            Ok::<_, TaskError>(())
        });
        let out = run_producer(p, feed(&ch, &bus), CancellationToken::new(), bus.clone()).await;

        assert_eq!(
            out.result,
            Err(TaskError::Panicked {
                info: "boom".into()
            })
        );
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ProducerStarting);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ProducerFailed);

        // The item offered before the panic is intact and the channel still works.
        assert!(ch.offer(2).is_ok());
        assert_eq!(ch.drain(), vec![1, 2]);
    }

    #[tokio::test]
    async fn cancellation_is_a_graceful_stop() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let ch = BoundedChannel::new(1);
        let token = CancellationToken::new();
        token.cancel();

        let p: ProducerRef<u32> = ProducerFn::arc("p", |_feed: Feed<u32>, ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        });
        let out = run_producer(p, feed(&ch, &bus), token, bus.clone()).await;

        assert_eq!(out.result, Err(TaskError::Canceled));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ProducerStarting);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ProducerStopped);
    }

    #[test]
    fn panic_payloads_render() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
