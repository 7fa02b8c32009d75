//! # Supervisor: wires producers to the idle loop and owns shutdown.
//!
//! The [`Supervisor`] owns the event bus, a [`SubscriberSet`], and global
//! runtime configuration. Each [`run`](Supervisor::run) creates a fresh
//! [`BoundedChannel`], spawns one fault-isolated task per producer and a
//! single [`IdleLoop`] consumer, and returns once the loop has ended and the
//! producers have been wound down.
//!
//! ## High-level architecture
//! ```text
//! run(producers, consumer):
//!
//!   Producer[0] ─┐  Feed (counts, OfferRejected)
//!   Producer[1] ─┼──────────────► BoundedChannel ──► IdleLoop ──► consumer(item)
//!   Producer[N] ─┘  (run_producer: catch_unwind)        │
//!                                                        ▼
//!                                              LoopReport { reason, .. }
//!
//! While the loop runs (drive):
//!   - OS signal            → publish ShutdownRequested, cancel loop
//!   - producer finished    → record outcome; if close_when_drained and none left → close channel
//!   - loop finished        → leave drive
//!
//! Wind-down:
//!   close channel → cancel producers → wait_producers(grace):
//!       ├─ all joined   → publish AllStoppedWithin
//!       └─ timeout      → abort rest, publish GraceExceeded → RuntimeError::GraceExceeded
//!   drain leftovers → RunReport
//!
//! Event flow:
//!   IdleLoop / producers / Feed ── publish ──► Bus ──► listener ──► SubscriberSet::emit
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use idlevisor::{Config, Feed, ProducerFn, ProducerRef, StopReason, Supervisor, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.capacity = 8;
//!     cfg.idle = Duration::from_millis(20);
//!     cfg.close_when_drained = true;
//!
//!     let sup = Supervisor::builder(cfg).build();
//!
//!     let numbers: ProducerRef<u32> =
//!         ProducerFn::arc("numbers", |feed: Feed<u32>, _ctx: CancellationToken| async move {
//!             for i in 0..5 {
//!                 let _ = feed.offer(i);
//!             }
//!             Ok::<_, TaskError>(())
//!         });
//!
//!     let report = sup.run(vec![numbers], |n| async move { println!("got {n}") }).await?;
//!     assert_eq!(report.loop_report.delivered + report.undelivered as u64, 5);
//!     assert_eq!(report.reason(), StopReason::SourceClosed);
//!     sup.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::channel::BoundedChannel;
use crate::core::builder::SupervisorBuilder;
use crate::core::config::Config;
use crate::core::report::{ProducerOutcome, RunReport};
use crate::core::runner::{panic_message, run_producer};
use crate::core::shutdown;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::idle::{IdleLoop, LoopReport};
use crate::producers::{Feed, FeedStats, ProducerRef};
use crate::subscribers::SubscriberSet;

/// Producer tasks of one run, keyed by task id for stuck reporting.
struct ProducerTasks {
    set: JoinSet<ProducerOutcome>,
    names: HashMap<task::Id, String>,
    outcomes: Vec<ProducerOutcome>,
}

impl ProducerTasks {
    fn record(&mut self, joined: Result<(task::Id, ProducerOutcome), JoinError>) {
        match joined {
            Ok((id, outcome)) => {
                self.names.remove(&id);
                self.outcomes.push(outcome);
            }
            Err(e) => {
                let name = self.names.remove(&e.id()).unwrap_or_default();
                let info = if e.is_panic() {
                    panic_message(e.into_panic().as_ref())
                } else {
                    e.to_string()
                };
                self.outcomes.push(ProducerOutcome {
                    name,
                    result: Err(TaskError::Panicked { info }),
                });
            }
        }
    }
}

/// Coordinates producers, the consumer loop, event delivery and shutdown.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    listener: JoinHandle<()>,
    listener_token: CancellationToken,
    runtime_token: CancellationToken,
}

impl Supervisor {
    /// Starts building a supervisor with the given configuration.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        runtime_token: CancellationToken,
    ) -> Self {
        let listener_token = CancellationToken::new();
        let listener =
            Self::subscriber_listener(&bus, Arc::clone(&subs), listener_token.clone());
        Self {
            cfg,
            bus,
            subs,
            listener,
            listener_token,
            runtime_token,
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus shared with the loop and producers.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Cancels every current and future run (the consumer loop and producers).
    pub fn cancel(&self) {
        self.runtime_token.cancel();
    }

    /// Runs `producers` against a fresh channel consumed by `consumer`.
    ///
    /// Returns when the consumer loop has stopped (idle timeout, source
    /// closed, or cancellation through a signal or [`cancel`](Self::cancel))
    /// and the producers have been closed out and cancelled.
    ///
    /// ### Errors
    /// - [`RuntimeError::LoopAborted`] if the consumer panicked.
    /// - [`RuntimeError::GraceExceeded`] if producers ignored cancellation for
    ///   longer than [`Config::grace`]; they are aborted.
    pub async fn run<T, F, Fut>(
        &self,
        producers: Vec<ProducerRef<T>>,
        consumer: F,
    ) -> Result<RunReport, RuntimeError>
    where
        T: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let channel = BoundedChannel::new(self.cfg.capacity_clamped());
        let stats = Arc::new(FeedStats::default());
        let producer_token = self.runtime_token.child_token();
        let loop_token = self.runtime_token.child_token();

        let mut tasks = ProducerTasks {
            set: JoinSet::new(),
            names: HashMap::with_capacity(producers.len()),
            outcomes: Vec::with_capacity(producers.len()),
        };
        for producer in producers {
            let name = producer.name().to_string();
            let feed = Feed::new(
                channel.clone(),
                name.as_str(),
                Arc::clone(&stats),
                self.bus.clone(),
            );
            let handle = tasks.set.spawn(run_producer(
                producer,
                feed,
                producer_token.clone(),
                self.bus.clone(),
            ));
            tasks.names.insert(handle.id(), name);
        }

        let idle_loop = IdleLoop::new(channel.clone(), self.cfg.idle)
            .with_cancellation(loop_token.clone())
            .with_bus(self.bus.clone());
        let mut consumer_task = tokio::spawn(idle_loop.run(consumer));

        let joined = self
            .drive(&mut consumer_task, &mut tasks, &channel, &loop_token)
            .await;

        channel.close();
        producer_token.cancel();
        let wound_down = self.wait_producers(&mut tasks).await;
        let undelivered = channel.drain().len();

        let loop_report = joined.map_err(|e| RuntimeError::LoopAborted {
            reason: if e.is_panic() {
                panic_message(e.into_panic().as_ref())
            } else {
                e.to_string()
            },
        })?;
        wound_down?;

        Ok(RunReport {
            loop_report,
            producers: tasks.outcomes,
            accepted: stats.accepted(),
            rejected: stats.rejected(),
            undelivered,
        })
    }

    /// Gracefully stops event delivery: waits for the listener to forward
    /// every published event and for each subscriber to process its queue.
    pub async fn shutdown(self) {
        let Supervisor {
            subs,
            listener,
            listener_token,
            runtime_token,
            ..
        } = self;
        runtime_token.cancel();
        listener_token.cancel();
        let _ = listener.await;
        if let Ok(set) = Arc::try_unwrap(subs) {
            set.shutdown().await;
        }
    }

    /// Waits for the loop while recording producers and watching for signals.
    async fn drive<T>(
        &self,
        consumer_task: &mut JoinHandle<LoopReport>,
        tasks: &mut ProducerTasks,
        channel: &BoundedChannel<T>,
        loop_token: &CancellationToken,
    ) -> Result<LoopReport, JoinError> {
        let signal = shutdown::wait_for_shutdown_signal();
        tokio::pin!(signal);
        let mut signal_seen = false;

        if tasks.set.is_empty() && self.cfg.close_when_drained {
            channel.close();
        }

        loop {
            tokio::select! {
                res = &mut *consumer_task => return res,
                res = &mut signal, if !signal_seen => {
                    signal_seen = true;
                    if res.is_ok() {
                        self.bus.publish(Event::new(EventKind::ShutdownRequested));
                        loop_token.cancel();
                    }
                }
                Some(joined) = tasks.set.join_next_with_id(), if !tasks.set.is_empty() => {
                    tasks.record(joined);
                    if tasks.set.is_empty() && self.cfg.close_when_drained {
                        channel.close();
                    }
                }
            }
        }
    }

    /// Waits up to [`Config::grace`] for the remaining producers.
    async fn wait_producers(&self, tasks: &mut ProducerTasks) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async {
            while let Some(joined) = tasks.set.join_next_with_id().await {
                tasks.record(joined);
            }
        };

        match time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                tasks.set.abort_all();
                let mut stuck: Vec<String> = tasks.names.drain().map(|(_, name)| name).collect();
                stuck.sort();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Forwards bus events to the subscriber set until `stop` is cancelled.
    ///
    /// On stop, events already queued on the bus are still forwarded.
    fn subscriber_listener(
        bus: &Bus,
        set: Arc<SubscriberSet>,
        stop: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
        })
    }
}
