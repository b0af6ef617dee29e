//! Builder for configuring pushable queues

use std::fmt;
use std::sync::Arc;

use crate::fifo::DEFAULT_PAGE_CAPACITY;
use crate::options::{ByteLength, PushableConfig};
use crate::{PushableError, Result};

use super::core::{CoreSettings, OnEnd};
use super::{Pushable, PushableV};

/// How the logical size of a pushed value is computed.
pub(crate) enum Measure<T> {
    /// Every value counts as one.
    Count,
    /// Byte length; `None` rejects the value.
    Bytes(Arc<dyn Fn(&T) -> Option<usize> + Send + Sync>),
}

impl<T> Measure<T> {
    pub(crate) fn size_of(&self, value: &T) -> Result<usize> {
        match self {
            Self::Count => Ok(1),
            Self::Bytes(measure) => measure(value).ok_or(PushableError::InvalidValueType),
        }
    }
}

impl<T> Clone for Measure<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Count => Self::Count,
            Self::Bytes(measure) => Self::Bytes(Arc::clone(measure)),
        }
    }
}

/// Builder for [`Pushable`] and [`PushableV`] queues.
///
/// Finish with [`build`](Self::build) for a value-at-a-time queue or
/// [`build_vectored`](Self::build_vectored) for a batching one.
///
/// ```rust
/// # fn main() -> pushable::Result<()> {
/// use pushable::Pushable;
///
/// let source = Pushable::<Vec<u8>>::builder()
///     .byte_mode()
///     .high_water_mark(64 * 1024)
///     .on_end(|err| {
///         if let Some(err) = err {
///             eprintln!("source failed: {err}");
///         }
///     })
///     .build()?;
/// # let _ = source;
/// # Ok(())
/// # }
/// ```
pub struct PushableBuilder<T> {
    measure: Option<Measure<T>>,
    /// Set by a config that disables object mode.
    bytes_required: bool,
    high_water_mark: Option<usize>,
    page_capacity: usize,
    on_end: Option<OnEnd>,
}

impl<T> PushableBuilder<T> {
    pub fn new() -> Self {
        Self {
            measure: None,
            bytes_required: false,
            high_water_mark: None,
            page_capacity: DEFAULT_PAGE_CAPACITY,
            on_end: None,
        }
    }

    /// Count values: the readable length is the number of buffered values.
    /// This is the default.
    pub fn object_mode(mut self) -> Self {
        self.measure = Some(Measure::Count);
        self.bytes_required = false;
        self
    }

    /// Measure values with a custom function.
    ///
    /// Values for which `measure` returns `None` are rejected with
    /// [`PushableError::InvalidValueType`].
    pub fn size_with(
        mut self,
        measure: impl Fn(&T) -> Option<usize> + Send + Sync + 'static,
    ) -> Self {
        self.measure = Some(Measure::Bytes(Arc::new(measure)));
        self
    }

    /// Suspend `push` while at least `mark` is buffered ahead of the value.
    pub fn high_water_mark(mut self, mark: usize) -> Self {
        self.high_water_mark = Some(mark);
        self
    }

    /// Capacity of the first buffer page; must be a power of two.
    pub fn page_capacity(mut self, capacity: usize) -> Self {
        self.page_capacity = capacity;
        self
    }

    /// Run `on_end` once when the queue reaches a terminal state.
    ///
    /// It receives the terminating error, if any. It runs on whichever task
    /// triggers the transition and must not block.
    pub fn on_end(mut self, on_end: impl FnOnce(Option<&PushableError>) + Send + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }

    /// Apply serialized settings.
    ///
    /// A config with `object_mode: false` needs a byte measure, installed
    /// with [`byte_mode`](Self::byte_mode) or [`size_with`](Self::size_with)
    /// either before or after this call.
    pub fn config(mut self, config: &PushableConfig) -> Self {
        if config.object_mode {
            self.measure = Some(Measure::Count);
            self.bytes_required = false;
        } else {
            if matches!(self.measure, Some(Measure::Count)) {
                self.measure = None;
            }
            self.bytes_required = true;
        }
        self.high_water_mark = config.high_water_mark;
        self.page_capacity = config.page_capacity;
        self
    }

    fn into_parts(self) -> Result<(CoreSettings, Measure<T>)> {
        let measure = match self.measure {
            Some(measure) => measure,
            None if self.bytes_required => {
                return Err(PushableError::Configuration(
                    "byte mode requires a byte measure (byte_mode or size_with)".to_string(),
                ));
            }
            None => Measure::Count,
        };
        let settings = CoreSettings {
            high_water_mark: self.high_water_mark,
            page_capacity: self.page_capacity,
            on_end: self.on_end,
        };
        Ok((settings, measure))
    }
}

impl<T: ByteLength + 'static> PushableBuilder<T> {
    /// Sum byte lengths: the readable length is the number of buffered bytes.
    pub fn byte_mode(mut self) -> Self {
        self.measure = Some(Measure::Bytes(Arc::new(|value: &T| value.byte_length())));
        self
    }
}

impl<T: Send + 'static> PushableBuilder<T> {
    /// Build a queue that yields one value per `next()`.
    pub fn build(self) -> Result<Pushable<T>> {
        let (settings, measure) = self.into_parts()?;
        Pushable::from_parts(settings, measure)
    }

    /// Build a queue that yields every buffered value per `next()`.
    pub fn build_vectored(self) -> Result<PushableV<T>> {
        let (settings, measure) = self.into_parts()?;
        PushableV::from_parts(settings, measure)
    }
}

impl<T> Default for PushableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PushableBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let measure = match &self.measure {
            Some(Measure::Count) => "count",
            Some(Measure::Bytes(_)) => "bytes",
            None if self.bytes_required => "unset (bytes required)",
            None => "unset",
        };
        f.debug_struct("PushableBuilder")
            .field("measure", &measure)
            .field("high_water_mark", &self.high_water_mark)
            .field("page_capacity", &self.page_capacity)
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}
