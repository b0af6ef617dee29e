//! Pushable - push-driven async queues
//!
//! A [`Pushable`] is an async source that producers push values into and a
//! consumer drains with `next()` (or as a [`Stream`](futures_util::Stream)).
//! Values come out in push order; the sequence ends gracefully with `end()`
//! or with an error via `end_with_error()`. The consumer can stop early with
//! `close()` or `throw()`.
//!
//! # Example
//!
//! ```rust
//! use pushable::Pushable;
//!
//! #[tokio::main]
//! async fn main() -> pushable::Result<()> {
//!     let source = Pushable::new();
//!
//!     let producer = source.clone();
//!     tokio::spawn(async move {
//!         for n in 0..3 {
//!             // resolves once the consumer has taken the value
//!             producer.push(n).await?;
//!         }
//!         producer.end().await
//!     });
//!
//!     while let Some(n) = source.next().await? {
//!         println!("got {n}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Backpressure and byte mode
//!
//! ```rust
//! use pushable::Pushable;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> pushable::Result<()> {
//! let source = Pushable::<Vec<u8>>::builder()
//!     .byte_mode()
//!     .high_water_mark(4)
//!     .build()?;
//!
//! // three bytes ahead of nothing: admitted immediately
//! source.push(vec![1, 2, 3]).await?;
//! // three bytes ahead, still under the mark
//! source.push(vec![4, 5]).await?;
//! assert_eq!(source.readable_length(), 5);
//!
//! // five bytes ahead: waits until the consumer catches up
//! let third = source.push(vec![6]);
//! assert!(!third.is_immediate());
//!
//! assert_eq!(source.next().await?, Some(vec![1, 2, 3]));
//! third.await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fifo;
pub mod item;
pub mod options;
pub mod pushable;
pub mod rendezvous;
pub mod signal;
pub mod telemetry;

// Re-export main types at crate root
pub use error::{PushableError, Result, UpstreamError};
pub use pushable::{Completion, Pushable, PushableBuilder, PushableV};

pub use fifo::Fifo;
pub use item::QueueItem;
pub use options::{ByteLength, PushableConfig, WaitOptions};
pub use rendezvous::Rendezvous;
pub use signal::{Abortable, abortable};

pub use tokio_util::sync::CancellationToken;
