//! Response body bounded by the request deadline.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use hyper::body::Incoming;
use tokio::time::Sleep;

use crate::error::ClientError;
use crate::resilience::timeouts::Deadline;

/// Response body that fails with [`ClientError::Timeout`] once the
/// request's overall deadline passes.
#[derive(Debug)]
pub struct TimedBody<B = Incoming> {
    inner: B,
    sleep: Pin<Box<Sleep>>,
    deadline: Deadline,
    expired: bool,
}

impl<B> TimedBody<B> {
    pub fn new(inner: B, deadline: Deadline) -> Self {
        Self {
            inner,
            sleep: Box::pin(deadline.sleep()),
            deadline,
            expired: false,
        }
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B> Body for TimedBody<B>
where
    B: Body<Data = Bytes, Error = hyper::Error> + Unpin,
{
    type Data = Bytes;
    type Error = ClientError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.expired {
            return Poll::Ready(None);
        }
        if this.sleep.as_mut().poll(cx).is_ready() {
            this.expired = true;
            tracing::debug!(timeout = ?this.deadline.budget(), "Response body read timed out");
            return Poll::Ready(Some(Err(this.deadline.error())));
        }
        Pin::new(&mut this.inner)
            .poll_frame(cx)
            .map(|frame| frame.map(|r| r.map_err(ClientError::Body)))
    }

    fn is_end_stream(&self) -> bool {
        self.expired || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
