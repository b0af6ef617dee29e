//! Queue configuration and per-call wait options.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::DEFAULT_ABORT_CODE;
use crate::fifo::DEFAULT_PAGE_CAPACITY;

/// Values that can report a length in bytes.
///
/// Required for byte-mode queues, where the readable length is the sum of
/// the byte lengths of the buffered values. Returning `None` means the value
/// has no usable byte length; a byte-mode queue rejects such values with
/// [`PushableError::InvalidValueType`](crate::PushableError::InvalidValueType).
pub trait ByteLength {
    fn byte_length(&self) -> Option<usize>;
}

impl ByteLength for [u8] {
    fn byte_length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<const N: usize> ByteLength for [u8; N] {
    fn byte_length(&self) -> Option<usize> {
        Some(N)
    }
}

impl ByteLength for Vec<u8> {
    fn byte_length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl ByteLength for VecDeque<u8> {
    fn byte_length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl ByteLength for str {
    fn byte_length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl ByteLength for String {
    fn byte_length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl ByteLength for Cow<'_, [u8]> {
    fn byte_length(&self) -> Option<usize> {
        Some(self.len())
    }
}

// Chunk lists report the sum of their chunks.

impl ByteLength for Vec<Vec<u8>> {
    fn byte_length(&self) -> Option<usize> {
        Some(self.iter().map(Vec::len).sum())
    }
}

impl ByteLength for VecDeque<Vec<u8>> {
    fn byte_length(&self) -> Option<usize> {
        Some(self.iter().map(Vec::len).sum())
    }
}

impl<T: ByteLength + ?Sized> ByteLength for &T {
    fn byte_length(&self) -> Option<usize> {
        (**self).byte_length()
    }
}

impl<T: ByteLength + ?Sized> ByteLength for Box<T> {
    fn byte_length(&self) -> Option<usize> {
        (**self).byte_length()
    }
}

impl<T: ByteLength + ?Sized> ByteLength for Arc<T> {
    fn byte_length(&self) -> Option<usize> {
        (**self).byte_length()
    }
}

impl<T: ByteLength + ?Sized> ByteLength for Rc<T> {
    fn byte_length(&self) -> Option<usize> {
        (**self).byte_length()
    }
}

/// An absent value has no byte length.
impl<T: ByteLength> ByteLength for Option<T> {
    fn byte_length(&self) -> Option<usize> {
        self.as_ref().and_then(ByteLength::byte_length)
    }
}

/// Serializable queue settings.
///
/// Apply with [`PushableBuilder::config`](crate::PushableBuilder::config).
///
/// ```rust
/// # use pushable::PushableConfig;
/// let config = PushableConfig::new()
///     .object_mode(false)
///     .high_water_mark(64 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushableConfig {
    /// Count values instead of summing byte lengths. Default: true, because
    /// byte mode needs a measure that only exists for
    /// [`ByteLength`] values or a custom `size_with` function. Setting it to
    /// false requires one of those on the builder.
    #[serde(default = "default_object_mode")]
    pub object_mode: bool,
    /// Readable length at which `push` starts to wait. Default: unbounded.
    #[serde(default)]
    pub high_water_mark: Option<usize>,
    /// Capacity of the first buffer page; must be a power of two. Default: 16.
    #[serde(default = "default_page_capacity")]
    pub page_capacity: usize,
}

fn default_object_mode() -> bool {
    true
}

fn default_page_capacity() -> usize {
    DEFAULT_PAGE_CAPACITY
}

impl Default for PushableConfig {
    fn default() -> Self {
        Self {
            object_mode: default_object_mode(),
            high_water_mark: None,
            page_capacity: default_page_capacity(),
        }
    }
}

impl PushableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_mode(mut self, enabled: bool) -> Self {
        self.object_mode = enabled;
        self
    }

    pub fn high_water_mark(mut self, mark: usize) -> Self {
        self.high_water_mark = Some(mark);
        self
    }

    pub fn page_capacity(mut self, capacity: usize) -> Self {
        self.page_capacity = capacity;
        self
    }
}

/// Options for a single waiting call (`push`, `end`, `on_empty`).
///
/// A fired token abandons only the call it was passed to; the queue keeps
/// running.
///
/// ```rust
/// # use pushable::WaitOptions;
/// use pushable::CancellationToken;
///
/// let token = CancellationToken::new();
/// let options = WaitOptions::new()
///     .signal(token.clone())
///     .error_code("TOOK_AGES");
/// ```
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    pub(crate) signal: Option<CancellationToken>,
    pub(crate) error_code: Option<String>,
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the wait when `token` is cancelled.
    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    /// Code reported by the resulting `Cancelled` error. Default: `ABORT_ERR`.
    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub(crate) fn code(&self) -> String {
        self.error_code
            .clone()
            .unwrap_or_else(|| DEFAULT_ABORT_CODE.to_string())
    }
}
