//! # LogWriter - simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [loop-started] idle_ms=50
//! [producer-starting] producer="ticker"
//! [delivered] total=1
//! [stale-drained] total=1
//! [offer-rejected] producer="ticker" reason="offer_full"
//! [loop-terminated] reason=idle-timeout delivered=2
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::LoopStarted => {
                println!("[loop-started] idle_ms={:?}", e.idle_ms);
            }
            EventKind::ItemDelivered => {
                println!("[delivered] total={:?}", e.delivered);
            }
            EventKind::StaleSignalDrained => {
                println!("[stale-drained] total={:?}", e.delivered);
            }
            EventKind::LoopTerminated => {
                let stop = e.stop_reason.map_or("unknown", |r| r.as_label());
                println!("[loop-terminated] reason={stop} delivered={:?}", e.delivered);
            }
            EventKind::ProducerStarting => {
                println!("[producer-starting] producer={source:?}");
            }
            EventKind::ProducerStopped => {
                println!("[producer-stopped] producer={source:?}");
            }
            EventKind::ProducerFailed => {
                println!("[producer-failed] producer={source:?} err={reason:?}");
            }
            EventKind::OfferRejected => {
                println!("[offer-rejected] producer={source:?} reason={reason:?}");
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded] stuck={reason}");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={source:?} reason={reason:?}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={source} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
