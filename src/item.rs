//! Entries carried by the pushable queue.

use crate::PushableError;

/// One entry in the queue: a value or a terminal marker.
///
/// Terminal markers travel in order with the values, so a graceful end is
/// observed only after every value pushed before it.
#[derive(Debug, Clone)]
pub enum QueueItem<T> {
    Value(T),
    /// Graceful end of the sequence.
    Done,
    /// The sequence ended with an error.
    Error(PushableError),
}

impl<T> QueueItem<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Value(_))
    }
}
