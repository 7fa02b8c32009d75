//! # Example: idle_race
//!
//! Demonstrates the drain-before-rearm behavior of the idle loop.
//!
//! Shows how to:
//! - Feed a small [`BoundedChannel`](idlevisor::BoundedChannel) from a producer
//!   through [`Feed::offer`], observing `Full` rejections
//! - Consume with a slow handler so the idle deadline passes mid-delivery
//! - Read the [`RunReport`](idlevisor::RunReport) after an idle timeout
//!
//! ## Flow
//! ```text
//! t=0ms    burst offers "A"           ─► loop delivers A (handler takes 60ms)
//! t=10ms   burst offers "B"           ─► queued
//! t=50ms   idle deadline passes while A is still being handled (stale signal)
//! t=60ms   burst offers "C"           ─► queued
//!          A done ─► reset: stop + drain stale signal + arm 50ms
//!          B delivered, then C delivered
//! t=...    silence for 50ms           ─► LoopTerminated { reason: idle-timeout }
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example idle_race --features logging
//! ```

use std::{sync::Arc, time::Duration};

use idlevisor::{Config, Feed, OfferError, ProducerFn, ProducerRef, Subscribe, Supervisor, TaskError};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== idle_race example ===\n");

    // 1. Configure runtime: tiny channel, short idle window
    let mut cfg = Config::default();
    cfg.capacity = 2;
    cfg.idle = Duration::from_millis(50);
    cfg.grace = Duration::from_secs(1);

    // 2. Optional: add subscriber to see events (requires "logging" feature)
    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = {
        use idlevisor::LogWriter;
        vec![Arc::new(LogWriter)]
    };
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    // 3. Create supervisor
    let sup = Supervisor::builder(cfg).with_subscribers(subs).build();

    // 4. Producer offering A, B, C on a fixed schedule, then waiting for cancellation
    let burst: ProducerRef<&'static str> =
        ProducerFn::arc("burst", |feed: Feed<&'static str>, ctx: CancellationToken| async move {
            for (item, pause) in [("A", 10), ("B", 50), ("C", 0)] {
                match feed.offer(item) {
                    Ok(()) => println!("[burst] offered {item}"),
                    Err(OfferError::Full(item)) => println!("[burst] channel full, dropped {item}"),
                    Err(OfferError::Closed(_)) => return Ok(()),
                }
                tokio::time::sleep(Duration::from_millis(pause)).await;
            }
            ctx.cancelled().await;
            Ok::<(), TaskError>(())
        });

    // 5. Slow consumer: each item takes longer than the idle window
    let report = sup
        .run(vec![burst], |item| async move {
            println!("[consumer] handling {item}");
            tokio::time::sleep(Duration::from_millis(60)).await;
        })
        .await?;

    // 6. Inspect the outcome
    println!("\n[report] reason={}", report.reason());
    println!("[report] delivered={}", report.loop_report.delivered);
    println!("[report] stale_drained={}", report.loop_report.stale_drained);
    println!(
        "[report] accepted={} rejected={} undelivered={}",
        report.accepted, report.rejected, report.undelivered
    );

    sup.shutdown().await;
    println!("\n=== example completed successfully ===");
    Ok(())
}
