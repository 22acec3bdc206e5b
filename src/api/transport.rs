// Streaming transport over an in-flight HTTP response

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::RequestBuilder;
use tokio_util::sync::CancellationToken;

use crate::stream::{BoxError, StreamError};

pub type ResponseStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Hands out body chunks one at a time, honouring cancellation.
///
/// Only one read is ever outstanding; once cancellation has been observed no
/// further chunk is requested from the underlying stream.
pub struct ChunkReader<S> {
    inner: S,
    cancel: CancellationToken,
    cancelled: bool,
}

impl<S, E> ChunkReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
{
    pub const fn new(inner: S, cancel: CancellationToken) -> Self {
        Self {
            inner,
            cancel,
            cancelled: false,
        }
    }

    /// Next chunk, `None` at end of stream
    pub async fn next(&mut self) -> Result<Option<Bytes>, StreamError> {
        if self.cancelled || self.cancel.is_cancelled() {
            self.cancelled = true;
            return Err(StreamError::Cancelled);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                self.cancelled = true;
                Err(StreamError::Cancelled)
            }
            item = self.inner.next() => match item {
                Some(Ok(chunk)) => Ok(Some(chunk)),
                Some(Err(err)) => Err(StreamError::Transport(err.into())),
                None => Ok(None),
            },
        }
    }
}

/// Send the request and bind a reader to its body.
///
/// A non-2xx status fails here, before any chunk is read, carrying the
/// status code and whatever body text the server sent.
pub async fn open(
    request: RequestBuilder,
    cancel: CancellationToken,
) -> Result<ChunkReader<ResponseStream>, StreamError> {
    let response = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(StreamError::Cancelled),
        response = request.send() => response?,
    };

    let status = response.status();
    if !status.is_success() {
        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(StreamError::Cancelled),
            body = response.text() => body.unwrap_or_default(),
        };
        return Err(StreamError::Http {
            status: status.as_u16(),
            body,
        });
    }

    tracing::debug!(%status, "response stream opened");
    Ok(ChunkReader::new(Box::pin(response.bytes_stream()), cancel))
}
