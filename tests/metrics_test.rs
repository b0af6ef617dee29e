//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use pushable::telemetry;
use pushable::{CancellationToken, Pushable, PushableV, WaitOptions};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a metric name with a specific label value.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

/// Runs async code within a local recorder scope.
///
/// `block_in_place` keeps the sync `with_local_recorder` closure on the
/// current thread while `block_on` drives the inner async work.
fn record<F, T>(recorder: &DebuggingRecorder, work: F) -> T
where
    F: std::future::Future<Output = T>,
{
    metrics::with_local_recorder(recorder, || {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(work))
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn push_and_delivery_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    record(&recorder, async {
        let source = Pushable::new();
        for n in 0..3 {
            let _ = source.push(n);
        }
        let _ = source.end();
        while source.next().await.unwrap().is_some() {}
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::VALUES_PUSHED_TOTAL), 3);
    assert_eq!(counter_total(&snapshot, telemetry::VALUES_DELIVERED_TOTAL), 3);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::TERMINATIONS_TOTAL, "reason", "end"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn batches_count_values() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    record(&recorder, async {
        let source = PushableV::new();
        let _ = source.push_v(vec![1, 2, 3]);
        let _ = source.push(4);
        source.next().await.unwrap();
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::VALUES_PUSHED_TOTAL), 4);
    assert_eq!(counter_total(&snapshot, telemetry::VALUES_DELIVERED_TOTAL), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn backpressure_waits_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    record(&recorder, async {
        let source = Pushable::builder().high_water_mark(1).build().unwrap();
        let _ = source.push(1);
        let _ = source.push(2);
        let _ = source.push(3);
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::BACKPRESSURE_WAITS_TOTAL), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn terminations_are_labelled() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    record(&recorder, async {
        let closed = Pushable::<u32>::new();
        closed.close();
        closed.close();

        let thrown = Pushable::<u32>::new();
        thrown.throw("stop");

        let failed = Pushable::<u32>::new();
        let _ = failed.end_with_error("boom");
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let name = telemetry::TERMINATIONS_TOTAL;
    assert_eq!(counter_with_label(&snapshot, name, "reason", "close"), 1);
    assert_eq!(counter_with_label(&snapshot, name, "reason", "throw"), 1);
    assert_eq!(counter_with_label(&snapshot, name, "reason", "error"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cancellations_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = record(&recorder, async {
        let source = Pushable::new();
        let token = CancellationToken::new();
        token.cancel();
        source
            .push_with(1, &WaitOptions::new().signal(token))
            .await
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CANCELLATIONS_TOTAL), 1);
}
