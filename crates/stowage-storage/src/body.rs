//! Upload body channel
//!
//! The writable side of an upload. Chunks pushed into a [`BodyWriter`] come out of the
//! paired [`ByteStream`] in order; the channel is bounded, so a slow store backpressures
//! the writer.

use bytes::Bytes;
use futures::StreamExt;
use stowage_core::{ByteStream, StreamError};
use tokio::sync::mpsc;

use crate::traits::{StorageError, StorageResult};

/// Chunks buffered between writer and store before `write` waits
pub const DEFAULT_BODY_CAPACITY: usize = 8;

/// Create a bounded body channel.
pub fn body_channel(capacity: usize) -> (BodyWriter, ByteStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let body = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed();
    (BodyWriter { tx }, body)
}

/// Writable side of an upload body.
#[derive(Debug)]
pub struct BodyWriter {
    tx: mpsc::Sender<Result<Bytes, StreamError>>,
}

impl BodyWriter {
    /// Push one chunk. Fails with [`StorageError::BodyClosed`] once the store stopped reading.
    pub async fn write(&self, chunk: Bytes) -> StorageResult<()> {
        self.tx
            .send(Ok(chunk))
            .await
            .map_err(|_| StorageError::BodyClosed)
    }

    /// Terminate the body with an error; the store sees it instead of end-of-body.
    pub async fn abort(self, error: StreamError) {
        // A store that already stopped reading has its own error to report
        let _ = self.tx.send(Err(error)).await;
    }

    /// End the body normally.
    pub fn finish(self) {}

    /// Whether the store side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
