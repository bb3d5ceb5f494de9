//! Stream decoding: raw network chunks to ordered stream frames.
//!
//! - [`decoder`]: the incremental frame parser with carry-over buffer
//! - [`utf8`]: byte-to-text conversion across chunk boundaries
//!
//! [`decode_frames`] ties both together over any byte stream.

pub mod decoder;
pub mod utf8;

pub use decoder::{feed, flush, Feed, SseDecoder, SseFrame};
pub use utf8::Utf8Carry;

use bytes::Bytes;
use std::pin::Pin;
use tokio_stream::{Stream, StreamExt};

/// Decode a byte stream into frames, preserving order.
///
/// A transport error is yielded once and ends the stream; frames already
/// completed before the error are yielded first. At a clean end of input
/// the decoder's remainder is flushed as a final frame.
pub fn decode_frames<S, E>(bytes: S) -> Pin<Box<dyn Stream<Item = Result<SseFrame, E>> + Send>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    let stream = async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut carry = Utf8Carry::new();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    let text = carry.decode(&chunk);
                    for frame in decoder.push(&text) {
                        yield Ok(frame);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        let tail = carry.finish();
        for frame in decoder.push(&tail) {
            yield Ok(frame);
        }
        for frame in decoder.finish() {
            yield Ok(frame);
        }
    };

    Box::pin(stream)
}
