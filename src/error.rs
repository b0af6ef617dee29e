//! Pushable error types

use std::sync::Arc;

/// Error raised by the producer and handed to the consumer.
pub type UpstreamError = Arc<dyn std::error::Error + Send + Sync>;

/// Pushable error types
///
/// Errors are `Clone` so that a terminal error can be reported again on
/// every `next()` after the queue has failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PushableError {
    // Producer-side misuse
    #[error("pushable has already ended")]
    AlreadyEnded,

    /// A byte-mode queue received a value that does not report a byte length.
    #[error("invalid value type: byte-mode pushable requires values with a byte length")]
    InvalidValueType,

    /// The producer ended the queue with an error, or the consumer threw
    /// one. Displays the error's own message.
    #[error("{0}")]
    Upstream(UpstreamError),

    /// A caller-supplied cancellation token fired while the call was waiting.
    #[error("the operation was aborted ({code})")]
    Cancelled { code: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Code carried by [`PushableError::Cancelled`] when the caller supplies none.
pub const DEFAULT_ABORT_CODE: &str = "ABORT_ERR";

impl PushableError {
    /// Wrap a producer error.
    ///
    /// Accepts anything that converts into a boxed error, including `&str`
    /// and `String`.
    pub fn upstream(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Upstream(Arc::from(err.into()))
    }

    /// Whether this error was caused by a cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Whether this error was supplied by the producer.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    /// Machine-readable code for the error.
    ///
    /// For `Cancelled` this is the caller-supplied code.
    pub fn code(&self) -> &str {
        match self {
            Self::AlreadyEnded => "ERR_ALREADY_ENDED",
            Self::InvalidValueType => "ERR_INVALID_VALUE_TYPE",
            Self::Upstream(_) => "ERR_UPSTREAM",
            Self::Cancelled { code } => code,
            Self::Configuration(_) => "ERR_CONFIGURATION",
        }
    }
}

/// Result type alias for pushable operations
pub type Result<T> = std::result::Result<T, PushableError>;
