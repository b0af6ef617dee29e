//! Cancellable waits.
//!
//! [`Abortable`] races a future against the [`CancellationToken`] carried by
//! [`WaitOptions`]. Both sources are checked in a single `poll`, the token
//! first, so a token that has already fired rejects the call before the
//! underlying future is polled at all.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;
use tokio_util::sync::WaitForCancellationFutureOwned;
use tracing::debug;

use crate::options::WaitOptions;
use crate::telemetry;
use crate::{PushableError, Result};

pin_project! {
    /// Future returned by [`abortable`].
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Abortable<F> {
        #[pin]
        future: F,
        #[pin]
        cancelled: Option<WaitForCancellationFutureOwned>,
        code: Option<String>,
    }
}

/// Wrap `future` so that it fails with [`PushableError::Cancelled`] when the
/// token in `options` fires first.
///
/// Without a token the future's output is passed through unchanged.
pub fn abortable<F: Future>(future: F, options: &WaitOptions) -> Abortable<F> {
    let cancelled = options
        .signal
        .as_ref()
        .map(|token| token.clone().cancelled_owned());
    let code = cancelled.as_ref().map(|_| options.code());
    Abortable {
        future,
        cancelled,
        code,
    }
}

impl<F: Future> Future for Abortable<F> {
    type Output = Result<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Some(cancelled) = this.cancelled.as_pin_mut() {
            if cancelled.poll(cx).is_ready() {
                let code = this.code.take().unwrap_or_default();
                debug!(code = %code, "wait abandoned by cancellation token");
                metrics::counter!(telemetry::CANCELLATIONS_TOTAL).increment(1);
                return Poll::Ready(Err(PushableError::Cancelled { code }));
            }
        }

        this.future.poll(cx).map(Ok)
    }
}
