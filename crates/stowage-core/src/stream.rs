//! Byte stream types shared by the source, transform and upload stages.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Errors carried inside a byte stream.
///
/// Cloneable so one upstream failure can be delivered to every consumer of a fanned-out
/// stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("Source stream failed: {0}")]
    Source(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Stream aborted: {0}")]
    Aborted(String),
}

/// Boxed stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>;

/// Wrap an async reader as a [`ByteStream`]; read errors become [`StreamError::Source`].
pub fn from_reader<R>(reader: R) -> ByteStream
where
    R: AsyncRead + Send + 'static,
{
    Box::pin(
        ReaderStream::new(reader).map(|chunk| chunk.map_err(|e| StreamError::Source(e.to_string()))),
    )
}

/// Wrap in-memory chunks as a [`ByteStream`].
pub fn from_chunks<I>(chunks: I) -> ByteStream
where
    I: IntoIterator<Item = Bytes>,
    I::IntoIter: Send + 'static,
{
    Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
}

/// Drain a stream into one contiguous buffer, stopping at the first error.
pub async fn collect_body(mut stream: ByteStream) -> Result<Bytes, StreamError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}
