use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use idlevisor::{
    Config, Event, EventKind, Feed, ProducerFn, ProducerRef, RuntimeError, StopReason, Subscribe,
    Supervisor, TaskError,
};

fn config(capacity: usize, idle_ms: u64) -> Config {
    let mut cfg = Config::default();
    cfg.capacity = capacity;
    cfg.idle = Duration::from_millis(idle_ms);
    cfg.grace = Duration::from_millis(500);
    cfg
}

fn burst(name: &'static str, count: u32) -> ProducerRef<u32> {
    ProducerFn::arc(name, move |feed: Feed<u32>, _ctx: CancellationToken| async move {
        for i in 0..count {
            let _ = feed.offer(i);
        }
        Ok::<_, TaskError>(())
    })
}

#[derive(Default)]
struct Recorder {
    kinds: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.kinds.lock().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn finished_producers_close_the_source() {
    let mut cfg = config(8, 10_000);
    cfg.close_when_drained = true;
    let sup = Supervisor::builder(cfg).build();

    let report = sup.run(vec![burst("numbers", 3)], |_| async {}).await.unwrap();

    assert_eq!(report.reason(), StopReason::SourceClosed);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.loop_report.delivered + report.undelivered as u64, 3);
    assert_eq!(report.producers.len(), 1);
    assert_eq!(report.faults().count(), 0);
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn no_producers_close_the_source_immediately() {
    let mut cfg = config(4, 10_000);
    cfg.close_when_drained = true;
    let sup = Supervisor::builder(cfg).build();

    let report = sup
        .run(Vec::<ProducerRef<u32>>::new(), |_| async {})
        .await
        .unwrap();

    assert_eq!(report.reason(), StopReason::SourceClosed);
    assert_eq!(report.loop_report.delivered, 0);
    assert!(report.loop_report.elapsed < Duration::from_millis(10_000));
    assert!(report.producers.is_empty());
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn silence_ends_the_run_and_offers_are_accounted() {
    let sup = Supervisor::builder(config(2, 50)).build();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let flood: ProducerRef<u32> =
        ProducerFn::arc("flood", |feed: Feed<u32>, ctx: CancellationToken| async move {
            for i in 0..5 {
                let _ = feed.offer(i);
            }
            ctx.cancelled().await;
            Ok::<_, TaskError>(())
        });

    let sink = Arc::clone(&seen);
    let report = sup
        .run(vec![flood], move |n| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().push(n) }
        })
        .await
        .unwrap();

    assert_eq!(report.reason(), StopReason::IdleTimeout);
    assert_eq!(report.accepted + report.rejected, 5);
    assert!(report.accepted >= 2);
    assert_eq!(report.loop_report.delivered, report.accepted);
    assert_eq!(report.undelivered, 0);
    assert_eq!(seen.lock().len() as u64, report.accepted);
    assert!(report.producers.iter().all(|p| p.result.is_ok()));
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn panicking_producer_is_contained() {
    let sup = Supervisor::builder(config(4, 100)).build();

    let bomb: ProducerRef<&'static str> =
        ProducerFn::arc("bomb", |_feed: Feed<&'static str>, _ctx: CancellationToken| async move {
            if true {
                panic!("boom");
            }
            Ok::<_, TaskError>(())
        });
    let late: ProducerRef<&'static str> =
        ProducerFn::arc("late", |feed: Feed<&'static str>, _ctx: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = feed.offer("x");
            Ok::<_, TaskError>(())
        });

    let report = sup.run(vec![bomb, late], |_| async {}).await.unwrap();

    assert_eq!(report.reason(), StopReason::IdleTimeout);
    assert_eq!(report.loop_report.delivered, 1);
    let faults: Vec<_> = report.faults().collect();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].name, "bomb");
    assert_eq!(
        faults[0].result,
        Err(TaskError::Panicked {
            info: "boom".into()
        })
    );
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn producer_ignoring_cancellation_exceeds_grace() {
    let mut cfg = config(4, 10);
    cfg.grace = Duration::from_millis(100);
    let sup = Supervisor::builder(cfg).build();

    let stuck: ProducerRef<u32> =
        ProducerFn::arc("stuck", |_feed: Feed<u32>, _ctx: CancellationToken| async move {
            std::future::pending::<()>().await;
            Ok::<_, TaskError>(())
        });

    let err = sup.run(vec![stuck, burst("quick", 1)], |_| async {}).await.unwrap_err();
    match err {
        RuntimeError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, Duration::from_millis(100));
            assert_eq!(stuck, vec!["stuck".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    sup.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_a_running_loop() {
    let sup = Supervisor::builder(config(4, 1_000)).build();

    let quiet: ProducerRef<u32> =
        ProducerFn::arc("quiet", |_feed: Feed<u32>, ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        });

    let (report, ()) = tokio::join!(sup.run(vec![quiet], |_| async {}), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        sup.cancel();
    });

    let report = report.unwrap();
    assert_eq!(report.reason(), StopReason::Cancelled);
    assert!(report.loop_report.elapsed < Duration::from_millis(1_000));
    assert_eq!(report.faults().count(), 0);
    sup.shutdown().await;
}

#[tokio::test]
async fn subscribers_observe_the_run() {
    let rec = Arc::new(Recorder::default());
    let mut cfg = config(8, 10_000);
    cfg.close_when_drained = true;
    let sup = Supervisor::builder(cfg).with_subscriber(rec.clone()).build();

    sup.run(vec![burst("numbers", 2)], |_| async {}).await.unwrap();
    sup.shutdown().await;

    let kinds = rec.kinds.lock().clone();
    for expected in [
        EventKind::LoopStarted,
        EventKind::ProducerStarting,
        EventKind::ProducerStopped,
        EventKind::LoopTerminated,
        EventKind::AllStoppedWithin,
    ] {
        assert!(kinds.contains(&expected), "missing {expected:?} in {kinds:?}");
    }
}
