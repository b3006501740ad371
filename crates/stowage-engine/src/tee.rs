//! Stream tee
//!
//! Fans one source body out to any number of taps. Every tap receives every chunk in
//! order. Taps are bounded, so the slowest consumer paces the source for all of them.
//!
//! - A source error is delivered to every tap and ends the tee.
//! - A tap whose consumer went away is dropped; the others keep receiving.
//! - With no taps, or once every tap is gone, the source is not read any further.

use bytes::Bytes;
use futures::StreamExt;
use stowage_core::{ByteStream, StreamError};
use tokio::sync::mpsc;

/// Chunks buffered per tap before the source is paused
pub const DEFAULT_TAP_CAPACITY: usize = 16;

type TapSender = mpsc::Sender<Result<Bytes, StreamError>>;

pub struct StreamTee {
    source: ByteStream,
    taps: Vec<TapSender>,
    capacity: usize,
}

impl StreamTee {
    pub fn new(source: ByteStream, capacity: usize) -> Self {
        Self {
            source,
            taps: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Open a new tap. Must be called before [`StreamTee::run`].
    pub fn tap(&mut self) -> ByteStream {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.taps.push(tx);
        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed()
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// Pump the source into every tap until it ends. Returns the bytes read.
    pub async fn run(self) -> Result<u64, StreamError> {
        let StreamTee {
            mut source,
            mut taps,
            ..
        } = self;
        let mut total = 0u64;

        while !taps.is_empty() {
            match source.next().await {
                Some(Ok(chunk)) => {
                    total += chunk.len() as u64;
                    let mut open = Vec::with_capacity(taps.len());
                    for tap in taps {
                        if tap.send(Ok(chunk.clone())).await.is_ok() {
                            open.push(tap);
                        }
                    }
                    taps = open;
                }
                Some(Err(e)) => {
                    for tap in &taps {
                        let _ = tap.send(Err(e.clone())).await;
                    }
                    return Err(e);
                }
                None => break,
            }
        }

        tracing::trace!(bytes = total, "Source stream drained");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use stowage_core::stream::{collect_body, from_chunks};

    fn chunks() -> ByteStream {
        from_chunks(vec![
            Bytes::from_static(b"one "),
            Bytes::from_static(b"two "),
            Bytes::from_static(b"three"),
        ])
    }

    #[tokio::test]
    async fn test_every_tap_gets_every_byte() {
        let mut tee = StreamTee::new(chunks(), 1);
        let taps: Vec<_> = (0..3).map(|_| tee.tap()).collect();
        assert_eq!(tee.tap_count(), 3);

        let pump = tokio::spawn(tee.run());
        let bodies = futures::future::join_all(taps.into_iter().map(collect_body)).await;

        for body in bodies {
            assert_eq!(body.unwrap(), Bytes::from_static(b"one two three"));
        }
        assert_eq!(pump.await.unwrap().unwrap(), 13);
    }

    #[tokio::test]
    async fn test_source_error_reaches_every_tap() {
        let source: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(StreamError::Source("connection reset".to_string())),
        ]));
        let mut tee = StreamTee::new(source, 4);
        let first = tee.tap();
        let second = tee.tap();

        let pump = tokio::spawn(tee.run());
        let (a, b) = tokio::join!(collect_body(first), collect_body(second));

        let expected = Err(StreamError::Source("connection reset".to_string()));
        assert_eq!(a, expected);
        assert_eq!(b, expected);
        assert!(pump.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_dropped_tap_does_not_stall_others() {
        let mut tee = StreamTee::new(chunks(), 1);
        let dropped = tee.tap();
        let kept = tee.tap();
        drop(dropped);

        let pump = tokio::spawn(tee.run());
        assert_eq!(
            collect_body(kept).await.unwrap(),
            Bytes::from_static(b"one two three")
        );
        assert!(pump.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_no_taps_reads_nothing() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        let source: ByteStream = chunks()
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .boxed();

        let read = StreamTee::new(source, 4).run().await.unwrap();
        assert_eq!(read, 0);
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }
}
