//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus,
//! statsd); without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `pushable_` and are counters ending in
//! `_total`.

/// Values accepted by `push`/`push_v` (one per value, not per call).
pub const VALUES_PUSHED_TOTAL: &str = "pushable_values_pushed_total";

/// Values handed to the consumer.
pub const VALUES_DELIVERED_TOTAL: &str = "pushable_values_delivered_total";

/// Pushes that found the queue at or above its high-water mark.
pub const BACKPRESSURE_WAITS_TOTAL: &str = "pushable_backpressure_waits_total";

/// Waits abandoned because their cancellation token fired.
pub const CANCELLATIONS_TOTAL: &str = "pushable_cancellations_total";

/// Queues that reached a terminal state.
///
/// Labels: `reason` ("end" | "error" | "close" | "throw").
pub const TERMINATIONS_TOTAL: &str = "pushable_terminations_total";
