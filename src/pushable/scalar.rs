use std::error::Error as StdError;
use std::fmt;
use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use futures_util::stream::FusedStream;

use crate::options::WaitOptions;
use crate::{PushableError, Result};

use super::builder::{Measure, PushableBuilder};
use super::completion::Completion;
use super::core::{Core, CoreSettings, Termination};

/// Async queue that producers push into and a consumer pulls from one value
/// at a time.
///
/// ```rust
/// use pushable::Pushable;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> pushable::Result<()> {
/// let source = Pushable::new();
///
/// // completions are only awaited by producers that care about delivery
/// let _ = source.push("hello");
/// let _ = source.push("world");
/// let _ = source.end();
///
/// assert_eq!(source.next().await?, Some("hello"));
/// assert_eq!(source.next().await?, Some("world"));
/// assert_eq!(source.next().await?, None);
/// # Ok(())
/// # }
/// ```
///
/// Clones share the queue, so a clone can be moved into a producer task
/// while the first handle is consumed. There is a single logical consumer:
/// concurrent `next()` calls from several tasks are not supported.
pub struct Pushable<T> {
    core: Arc<Core<T>>,
    measure: Measure<T>,
    /// Stream side: set once a terminal item has been yielded.
    finished: bool,
}

impl<T: Send + 'static> Pushable<T> {
    /// Unbounded queue in object mode.
    pub fn new() -> Self {
        Self {
            core: Arc::new(Core::unbounded()),
            measure: Measure::Count,
            finished: false,
        }
    }

    pub fn builder() -> PushableBuilder<T> {
        PushableBuilder::new()
    }

    pub(crate) fn from_parts(settings: CoreSettings, measure: Measure<T>) -> Result<Self> {
        Ok(Self {
            core: Arc::new(Core::new(settings)?),
            measure,
            finished: false,
        })
    }

    /// Enqueue `value`.
    ///
    /// The value is buffered before this returns. The returned
    /// [`Completion`] resolves when the value has been delivered (or
    /// discarded by `close`/`throw`); with a high-water mark it resolves as
    /// soon as less than the mark is buffered ahead of the value.
    ///
    /// Fails with [`PushableError::AlreadyEnded`] after `end`, `close` or
    /// `throw`, and with [`PushableError::InvalidValueType`] when byte mode
    /// cannot measure the value.
    pub fn push(&self, value: T) -> Completion {
        self.push_with(value, &WaitOptions::default())
    }

    /// [`push`](Self::push) with a cancellable wait.
    pub fn push_with(&self, value: T, options: &WaitOptions) -> Completion {
        match self.measure.size_of(&value) {
            Ok(size) => self.core.push(value, 1, size, options),
            Err(err) => Completion::ready(Err(err)),
        }
    }

    /// Enqueue `value` without waiting for delivery.
    pub fn try_push(&self, value: T) -> Result<()> {
        self.push(value).into_immediate()
    }

    /// Finish the sequence gracefully.
    ///
    /// Buffered values are still delivered; the consumer then sees `None`.
    /// The completion resolves once the consumer has reached the end.
    /// Calls after the queue stopped accepting values are no-ops.
    pub fn end(&self) -> Completion {
        self.end_with(&WaitOptions::default())
    }

    /// [`end`](Self::end) with a cancellable wait.
    pub fn end_with(&self, options: &WaitOptions) -> Completion {
        self.core.end(options)
    }

    /// Finish the sequence with an error.
    ///
    /// Buffered values are discarded and the consumer's next `next()`
    /// fails with [`PushableError::Upstream`].
    pub fn end_with_error(
        &self,
        err: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Completion {
        self.core
            .terminate(Some(PushableError::upstream(err)), Termination::Error);
        Completion::ready(Ok(()))
    }

    /// Next value, or `None` once the sequence has ended.
    ///
    /// Cancel safe: dropping the future before it resolves loses nothing.
    pub async fn next(&self) -> Result<Option<T>> {
        poll_fn(|cx| self.core.poll_next(cx)).await
    }

    /// Stop consuming: discard buffered values and end the sequence.
    pub fn close(&self) {
        self.core.terminate(None, Termination::Close);
    }

    /// Stop consuming with an error: discard buffered values and fail the
    /// sequence.
    pub fn throw(&self, err: impl Into<Box<dyn StdError + Send + Sync>>) {
        self.core
            .terminate(Some(PushableError::upstream(err)), Termination::Throw);
    }

    /// Buffered values in object mode, buffered bytes in byte mode.
    pub fn readable_length(&self) -> usize {
        self.core.readable_length()
    }

    /// Resolves the next time the buffer is empty.
    pub fn on_empty(&self) -> Completion {
        self.on_empty_with(&WaitOptions::default())
    }

    /// [`on_empty`](Self::on_empty) with a cancellable wait.
    pub fn on_empty_with(&self, options: &WaitOptions) -> Completion {
        self.core.on_empty(options)
    }
}

impl<T> Clone for Pushable<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            measure: self.measure.clone(),
            finished: false,
        }
    }
}

impl<T: Send + 'static> Default for Pushable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> fmt::Debug for Pushable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pushable")
            .field("readable_length", &self.readable_length())
            .finish_non_exhaustive()
    }
}

/// Yields each value as `Ok`. A failed sequence yields its error once and
/// then ends.
impl<T: Send + 'static> Stream for Pushable<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        let item = match self.core.poll_next(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(value)) => value.map(Ok),
            Poll::Ready(Err(err)) => Some(Err(err)),
        };
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        Poll::Ready(item)
    }
}

impl<T: Send + 'static> FusedStream for Pushable<T> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
