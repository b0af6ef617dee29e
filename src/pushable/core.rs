//! Shared state machine behind [`Pushable`](super::Pushable) and
//! [`PushableV`](super::PushableV).
//!
//! # Lifecycle
//!
//! ```text
//! Active --push--> Active
//! Active --end()--> Ending --(terminal marker consumed)--> Ended
//! Active --end(err) / throw--> Failed      (buffer cleared)
//! Active|Ending --close--> Ended           (buffer cleared)
//! Active|Ending --throw--> Failed          (buffer cleared)
//! ```
//!
//! `Ended` and `Failed` are sticky: every later `next()` reports the same
//! terminal result. The finalizer runs exactly once, outside the lock.
//!
//! The state lives behind a `std::sync::Mutex` that is never held across an
//! await point. Producers that wait (delivery, high-water mark, drain) park
//! on `oneshot` receivers or [`Notify`] and re-check the state on wake-up.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::item::QueueItem;
use crate::options::WaitOptions;
use crate::rendezvous::Rendezvous;
use crate::signal::abortable;
use crate::telemetry;
use crate::{PushableError, Result};

use super::completion::Completion;

/// Finalizer invoked once when the queue reaches a terminal state.
pub(crate) type OnEnd = Box<dyn FnOnce(Option<&PushableError>) + Send>;

#[derive(Debug, Clone)]
enum Phase {
    Active,
    /// `end()` was called; buffered values and the terminal marker are
    /// still being drained.
    Ending,
    Ended,
    Failed(PushableError),
}

/// Why a queue stopped accepting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    /// Producer called `end` with an error.
    Error,
    /// Consumer called `close`.
    Close,
    /// Consumer called `throw`.
    Throw,
}

impl Termination {
    fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Close => "close",
            Self::Throw => "throw",
        }
    }
}

struct State<I> {
    queue: Rendezvous<QueueItem<I>>,
    phase: Phase,
    /// Set by the first `next()`.
    piped: bool,
    on_end: Option<OnEnd>,
}

pub(crate) struct Core<I> {
    state: Mutex<State<I>>,
    high_water_mark: Option<usize>,
    /// Signalled whenever buffered values are released.
    space: Notify,
    /// Signalled whenever the buffer becomes empty.
    drained: Notify,
}

/// Settings shared by both queue flavours.
pub(crate) struct CoreSettings {
    pub(crate) high_water_mark: Option<usize>,
    pub(crate) page_capacity: usize,
    pub(crate) on_end: Option<OnEnd>,
}

fn finalize(on_end: Option<OnEnd>, err: Option<&PushableError>) {
    if let Some(on_end) = on_end {
        debug!(error = err.map(tracing::field::display), "running pushable finalizer");
        on_end(err);
    }
}

impl<I: Send + 'static> Core<I> {
    pub(crate) fn new(settings: CoreSettings) -> Result<Self> {
        if settings.high_water_mark == Some(0) {
            return Err(PushableError::Configuration(
                "high-water mark must be greater than zero".to_string(),
            ));
        }
        let queue = Rendezvous::with_page_capacity(settings.page_capacity)?;
        Ok(Self {
            state: Mutex::new(State {
                queue,
                phase: Phase::Active,
                piped: false,
                on_end: settings.on_end,
            }),
            high_water_mark: settings.high_water_mark,
            space: Notify::new(),
            drained: Notify::new(),
        })
    }

    /// Unbounded queue with default paging and no finalizer.
    pub(crate) fn unbounded() -> Self {
        Self {
            state: Mutex::new(State {
                queue: Rendezvous::new(),
                phase: Phase::Active,
                piped: false,
                on_end: None,
            }),
            high_water_mark: None,
            space: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// No user code runs under the lock, so a poisoned lock still holds
    /// consistent state.
    fn lock(&self) -> MutexGuard<'_, State<I>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue one entry holding `values` values with the given logical size.
    pub(crate) fn push(
        self: &Arc<Self>,
        item: I,
        values: usize,
        size: usize,
        options: &WaitOptions,
    ) -> Completion {
        let (receipt, ahead) = {
            let mut state = self.lock();
            if !matches!(state.phase, Phase::Active) {
                return Completion::ready(Err(PushableError::AlreadyEnded));
            }
            let receipt = state.queue.push(QueueItem::Value(item), size);
            let ahead = state.queue.size_ahead(receipt.position);
            trace!(readable_length = state.queue.size(), "value pushed");
            (receipt, ahead)
        };
        metrics::counter!(telemetry::VALUES_PUSHED_TOTAL).increment(values as u64);

        let Some(mark) = self.high_water_mark else {
            return Completion::waiting(abortable(receipt.delivered, options));
        };
        if ahead < mark as u64 {
            return Completion::ready(Ok(()));
        }

        metrics::counter!(telemetry::BACKPRESSURE_WAITS_TOTAL).increment(1);
        trace!(ahead, high_water_mark = mark, "push waiting for capacity");
        let core = Arc::clone(self);
        let position = receipt.position;
        Completion::waiting(abortable(
            async move { core.admitted(position, mark as u64).await },
            options,
        ))
    }

    /// Resolves once less than `mark` is buffered ahead of `position`.
    async fn admitted(&self, position: u64, mark: u64) {
        loop {
            let notified = self.space.notified();
            let ahead = self.lock().queue.size_ahead(position);
            if ahead < mark {
                return;
            }
            notified.await;
        }
    }

    /// Graceful end: values already buffered are still delivered.
    pub(crate) fn end(self: &Arc<Self>, options: &WaitOptions) -> Completion {
        let mut state = self.lock();
        if !matches!(state.phase, Phase::Active) {
            return Completion::ready(Ok(()));
        }
        metrics::counter!(telemetry::TERMINATIONS_TOTAL, "reason" => "end").increment(1);

        if !state.piped && state.queue.is_empty() {
            // nobody is iterating and nothing is buffered
            debug!("pushable ended before consumption");
            state.phase = Phase::Ended;
            let on_end = state.on_end.take();
            drop(state);
            self.notify_released(true);
            finalize(on_end, None);
            return Completion::ready(Ok(()));
        }

        debug!(readable_length = state.queue.size(), "pushable ending");
        state.phase = Phase::Ending;
        let receipt = state.queue.push(QueueItem::Done, 0);
        drop(state);
        Completion::waiting(abortable(receipt.delivered, options))
    }

    /// Stop the queue, discarding everything buffered.
    ///
    /// With an error the consumer observes it on its next (or current)
    /// `next()`; without one the consumer sees the end of the sequence.
    pub(crate) fn terminate(&self, err: Option<PushableError>, reason: Termination) {
        let mut state = self.lock();
        let accepted = match state.phase {
            Phase::Active => true,
            Phase::Ending => reason != Termination::Error,
            Phase::Ended | Phase::Failed(_) => false,
        };
        if !accepted {
            return;
        }
        metrics::counter!(telemetry::TERMINATIONS_TOTAL, "reason" => reason.label()).increment(1);
        debug!(
            reason = reason.label(),
            discarded = state.queue.len(),
            error = err.as_ref().map(tracing::field::display),
            "pushable terminated"
        );

        state.queue.clear();
        match &err {
            Some(err) => {
                state.phase = Phase::Failed(err.clone());
                // in-band marker; wakes a consumer waiting in next()
                let _ = state.queue.push(QueueItem::Error(err.clone()), 0);
            }
            None => {
                state.phase = Phase::Ended;
                state.queue.wake();
            }
        }
        let on_end = state.on_end.take();
        drop(state);

        self.notify_released(true);
        finalize(on_end, err.as_ref());
    }

    pub(crate) fn readable_length(&self) -> usize {
        self.lock().queue.size()
    }

    /// Settles the next time the buffer is empty.
    pub(crate) fn on_empty(self: &Arc<Self>, options: &WaitOptions) -> Completion {
        let core = Arc::clone(self);
        Completion::waiting(abortable(
            async move {
                loop {
                    let notified = core.drained.notified();
                    let empty = core.lock().queue.is_empty();
                    if empty {
                        return;
                    }
                    notified.await;
                }
            },
            options,
        ))
    }

    fn notify_released(&self, drained: bool) {
        self.space.notify_waiters();
        if drained {
            self.drained.notify_waiters();
        }
    }

    /// Terminal result for an empty queue that is no longer active.
    fn terminal_result(&self, mut state: MutexGuard<'_, State<I>>) -> Result<Option<I>> {
        if let Phase::Failed(err) = &state.phase {
            return Err(err.clone());
        }
        state.phase = Phase::Ended;
        let on_end = state.on_end.take();
        drop(state);
        finalize(on_end, None);
        Ok(None)
    }

    /// Handle a terminal marker taken off the queue.
    fn finish_with(
        &self,
        mut state: MutexGuard<'_, State<I>>,
        marker: QueueItem<I>,
    ) -> Result<Option<I>> {
        let err = match marker {
            QueueItem::Error(err) => Some(err),
            _ => None,
        };
        state.phase = match &err {
            Some(err) => Phase::Failed(err.clone()),
            None => Phase::Ended,
        };
        let drained = state.queue.is_empty();
        let on_end = state.on_end.take();
        drop(state);

        self.notify_released(drained);
        finalize(on_end, err.as_ref());
        match err {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    /// Take one entry, waiting if the queue is empty and still active.
    pub(crate) fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Result<Option<I>>> {
        let mut state = self.lock();
        state.piped = true;

        if state.queue.is_empty() && !matches!(state.phase, Phase::Active) {
            return Poll::Ready(self.terminal_result(state));
        }

        match state.queue.poll_shift(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(QueueItem::Value(value)) => {
                let drained = state.queue.is_empty();
                trace!(readable_length = state.queue.size(), "value shifted");
                drop(state);
                self.notify_released(drained);
                metrics::counter!(telemetry::VALUES_DELIVERED_TOTAL).increment(1);
                Poll::Ready(Ok(Some(value)))
            }
            Poll::Ready(marker) => Poll::Ready(self.finish_with(state, marker)),
        }
    }
}

impl<T: Send + 'static> Core<Vec<T>> {
    /// Take every buffered value as one batch, waiting if there is none.
    ///
    /// A graceful terminal marker found behind buffered values is absorbed:
    /// the values are returned now and the end of the sequence on the
    /// following call.
    pub(crate) fn poll_next_batch(&self, cx: &mut Context<'_>) -> Poll<Result<Option<Vec<T>>>> {
        let mut state = self.lock();
        state.piped = true;

        if state.queue.is_empty() && !matches!(state.phase, Phase::Active) {
            return Poll::Ready(self.terminal_result(state));
        }

        let mut batch = Vec::new();
        while let Some(item) = state.queue.try_shift() {
            match item {
                QueueItem::Value(values) => batch.extend(values),
                // phase stays Ending: the next call reports the end and
                // close/throw still run the finalizer
                QueueItem::Done if !batch.is_empty() => break,
                marker => return Poll::Ready(self.finish_with(state, marker)),
            }
        }

        if batch.is_empty() {
            // only empty batches were buffered
            state.queue.register(cx.waker());
            drop(state);
            self.notify_released(true);
            return Poll::Pending;
        }

        trace!(batch = batch.len(), "batch shifted");
        drop(state);
        self.notify_released(true);
        metrics::counter!(telemetry::VALUES_DELIVERED_TOTAL).increment(batch.len() as u64);
        Poll::Ready(Ok(Some(batch)))
    }
}
