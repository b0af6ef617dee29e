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

/// Batching variant of [`Pushable`](super::Pushable).
///
/// Every `next()` returns all values buffered at that moment as one `Vec`,
/// never an empty one. Single values are delivered as one-element batches.
///
/// ```rust
/// use pushable::PushableV;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> pushable::Result<()> {
/// let source = PushableV::new();
///
/// let _ = source.push(1);
/// let _ = source.push_v(vec![2, 3]);
/// let _ = source.end();
///
/// assert_eq!(source.next().await?, Some(vec![1, 2, 3]));
/// assert_eq!(source.next().await?, None);
/// # Ok(())
/// # }
/// ```
pub struct PushableV<T> {
    core: Arc<Core<Vec<T>>>,
    measure: Measure<T>,
    finished: bool,
}

impl<T: Send + 'static> PushableV<T> {
    /// Unbounded batching queue in object mode.
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

    /// Enqueue a single value.
    pub fn push(&self, value: T) -> Completion {
        self.push_v(vec![value])
    }

    /// Enqueue a single value with a cancellable wait.
    pub fn push_with(&self, value: T, options: &WaitOptions) -> Completion {
        self.push_v_with(vec![value], options)
    }

    /// Enqueue several values at once.
    ///
    /// They are delivered together with whatever else is buffered. The
    /// logical size of the entry is the sum of the values' sizes.
    pub fn push_v(&self, values: Vec<T>) -> Completion {
        self.push_v_with(values, &WaitOptions::default())
    }

    /// [`push_v`](Self::push_v) with a cancellable wait.
    pub fn push_v_with(&self, values: Vec<T>, options: &WaitOptions) -> Completion {
        let mut size = 0;
        for value in &values {
            match self.measure.size_of(value) {
                Ok(n) => size += n,
                Err(err) => return Completion::ready(Err(err)),
            }
        }
        let count = values.len();
        self.core.push(values, count, size, options)
    }

    /// Enqueue values without waiting for delivery.
    pub fn try_push_v(&self, values: Vec<T>) -> Result<()> {
        self.push_v(values).into_immediate()
    }

    /// Finish the sequence gracefully once buffered values are delivered.
    pub fn end(&self) -> Completion {
        self.end_with(&WaitOptions::default())
    }

    /// [`end`](Self::end) with a cancellable wait.
    pub fn end_with(&self, options: &WaitOptions) -> Completion {
        self.core.end(options)
    }

    /// Finish the sequence with an error, discarding buffered values.
    pub fn end_with_error(
        &self,
        err: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Completion {
        self.core
            .terminate(Some(PushableError::upstream(err)), Termination::Error);
        Completion::ready(Ok(()))
    }

    /// Every buffered value, or `None` once the sequence has ended.
    pub async fn next(&self) -> Result<Option<Vec<T>>> {
        poll_fn(|cx| self.core.poll_next_batch(cx)).await
    }

    /// Stop consuming: discard buffered values and end the sequence.
    pub fn close(&self) {
        self.core.terminate(None, Termination::Close);
    }

    /// Stop consuming with an error.
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

impl<T> Clone for PushableV<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            measure: self.measure.clone(),
            finished: false,
        }
    }
}

impl<T: Send + 'static> Default for PushableV<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> fmt::Debug for PushableV<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushableV")
            .field("readable_length", &self.readable_length())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Stream for PushableV<T> {
    type Item = Result<Vec<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        let item = match self.core.poll_next_batch(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(batch)) => batch.map(Ok),
            Poll::Ready(Err(err)) => Some(Err(err)),
        };
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        Poll::Ready(item)
    }
}

impl<T: Send + 'static> FusedStream for PushableV<T> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
