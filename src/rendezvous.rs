//! Rendezvous queue pairing producers with a waiting consumer.
//!
//! [`Rendezvous`] sits on top of a [`Fifo`] and adds two things:
//!
//! - a slot for the waker of the consumer that found the buffer empty, so a
//!   push hands the value straight to it;
//! - a per-value [`Delivered`] signal that settles once the value has been
//!   taken by the consumer (or discarded by [`Rendezvous::clear`]).
//!
//! Values are handed out strictly in push order: the Nth shift receives the
//! Nth push regardless of how the calls interleave.
//!
//! The queue is a plain `&mut self` structure; callers that share it between
//! tasks wrap it in a lock, as [`Pushable`](crate::Pushable) does.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use tokio::sync::oneshot;

use crate::Result;
use crate::fifo::{Fifo, Sizer};

struct Slot<T> {
    value: T,
    size: usize,
    delivered: oneshot::Sender<()>,
}

/// Settles when a pushed value has left the queue.
///
/// That is either delivery to the consumer or removal by
/// [`Rendezvous::clear`]. Dropping it has no effect on the value.
#[derive(Debug)]
pub struct Delivered {
    rx: oneshot::Receiver<()>,
}

impl Future for Delivered {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // a dropped sender means the value was discarded
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}

/// Returned by [`Rendezvous::push`].
#[derive(Debug)]
pub struct Receipt {
    /// Settles when the value leaves the queue.
    pub delivered: Delivered,
    /// Logical position of the value in the stream of everything ever pushed.
    /// Use with [`Rendezvous::size_ahead`].
    pub position: u64,
}

/// FIFO hand-off between producers and a single consumer.
pub struct Rendezvous<T> {
    buffer: Fifo<Slot<T>>,
    consumer: Option<Waker>,
    /// Total logical size ever pushed.
    pushed: u64,
    /// Total logical size ever shifted or cleared.
    released: u64,
}

impl<T: 'static> Rendezvous<T> {
    pub fn new() -> Self {
        Self {
            buffer: Fifo::with_sizer(|slot: &Slot<T>| slot.size),
            consumer: None,
            pushed: 0,
            released: 0,
        }
    }

    /// Create a queue whose first buffer page holds `capacity` values.
    pub fn with_page_capacity(capacity: usize) -> Result<Self> {
        let sizer: Sizer<Slot<T>> = Arc::new(|slot: &Slot<T>| slot.size);
        let buffer = Fifo::with_page_capacity(capacity, Some(sizer))?;
        Ok(Self {
            buffer,
            consumer: None,
            pushed: 0,
            released: 0,
        })
    }
}

impl<T> Rendezvous<T> {
    /// Enqueue `value` with the given logical size and wake the waiting
    /// consumer, if any.
    pub fn push(&mut self, value: T, size: usize) -> Receipt {
        let (tx, rx) = oneshot::channel();
        let position = self.pushed;
        self.pushed += size as u64;
        self.buffer.push(Slot {
            value,
            size,
            delivered: tx,
        });
        self.wake();

        Receipt {
            delivered: Delivered { rx },
            position,
        }
    }

    /// Take the oldest value, or register the consumer's waker if there is
    /// none yet.
    pub fn poll_shift(&mut self, cx: &mut Context<'_>) -> Poll<T> {
        match self.try_shift() {
            Some(value) => Poll::Ready(value),
            None => {
                self.register(cx.waker());
                Poll::Pending
            }
        }
    }

    /// Take the oldest value without waiting.
    pub fn try_shift(&mut self) -> Option<T> {
        let slot = self.buffer.shift()?;
        self.released += slot.size as u64;
        // the pusher may have stopped listening
        let _ = slot.delivered.send(());
        Some(slot.value)
    }

    pub fn peek(&self) -> Option<&T> {
        self.buffer.peek().map(|slot| &slot.value)
    }

    /// Store the waker of a consumer that is about to wait.
    pub fn register(&mut self, waker: &Waker) {
        match &self.consumer {
            Some(existing) if existing.will_wake(waker) => {}
            _ => self.consumer = Some(waker.clone()),
        }
    }

    /// Wake the waiting consumer so it polls again.
    pub fn wake(&mut self) {
        if let Some(waker) = self.consumer.take() {
            waker.wake();
        }
    }

    pub fn has_waiting_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    /// Discard every buffered value.
    ///
    /// Their [`Delivered`] signals settle. A waiting consumer stays
    /// registered.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.released = self.pushed;
    }

    /// Logical size still buffered ahead of the value pushed at `position`.
    pub fn size_ahead(&self, position: u64) -> u64 {
        position.saturating_sub(self.released)
    }

    /// Logical size of the buffered (not yet shifted) values.
    pub fn size(&self) -> usize {
        self.buffer.size()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl<T: 'static> Default for Rendezvous<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Rendezvous<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rendezvous")
            .field("buffer", &self.buffer)
            .field("waiting_consumer", &self.consumer.is_some())
            .finish()
    }
}
