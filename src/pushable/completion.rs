use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;

use crate::Result;

/// Completion of a `push`, `end` or `on_empty` call.
///
/// The call itself takes effect immediately (values are enqueued before it
/// returns); this future only reports when the operation has completed.
/// Dropping it without awaiting is fine and leaves the queued value in
/// place.
pub struct Completion {
    inner: Inner,
}

enum Inner {
    Ready(Option<Result<()>>),
    Waiting(BoxFuture<'static, Result<()>>),
}

impl Completion {
    pub(crate) fn ready(result: Result<()>) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    pub(crate) fn waiting<F>(future: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            inner: Inner::Waiting(Box::pin(future)),
        }
    }

    /// Whether the outcome was known when the call returned.
    pub fn is_immediate(&self) -> bool {
        matches!(self.inner, Inner::Ready(_))
    }

    /// Outcome known at call time; a pending completion counts as success.
    pub(crate) fn into_immediate(self) -> Result<()> {
        match self.inner {
            Inner::Ready(result) => result.unwrap_or(Ok(())),
            Inner::Waiting(_) => Ok(()),
        }
    }
}

impl Future for Completion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        match &mut self.inner {
            Inner::Ready(result) => Poll::Ready(result.take().unwrap_or(Ok(()))),
            Inner::Waiting(future) => future.as_mut().poll(cx),
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.inner {
            Inner::Ready(_) => "ready",
            Inner::Waiting(_) => "waiting",
        };
        f.debug_struct("Completion").field("state", &state).finish()
    }
}
