//! Push-driven async queues.
//!
//! - [`Pushable`] yields one value per `next()`.
//! - [`PushableV`] yields everything buffered as one `Vec` per `next()`.
//!
//! Both are cheap to clone; clones share the same queue. Producers push
//! from any task while a single consumer pulls with `next()` or through the
//! [`Stream`](futures_util::Stream) implementation.

mod builder;
mod completion;
mod core;
mod scalar;
mod vectored;

pub use builder::PushableBuilder;
pub use completion::Completion;
pub use scalar::Pushable;
pub use vectored::PushableV;
