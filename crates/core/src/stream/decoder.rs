//! Incremental decoder for text-event-stream frames.
//!
//! Frames are separated by a blank line. Within a frame, an `event:` line
//! sets the event name (default `message`) and a `data:` line carries the
//! payload. The last blank-line-separated segment of the accumulated buffer
//! is always held back as a possibly incomplete remainder, so fragment
//! boundaries never have to line up with frame boundaries.

use serde_json::Value;
use tracing::debug;

/// Separator between frames.
pub const FRAME_TERMINATOR: &str = "\n\n";

/// Event name used when a frame has no `event:` line.
pub const DEFAULT_EVENT_NAME: &str = "message";

/// One decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    /// Value of the `event:` line, or `message`.
    pub event: String,

    /// The `data:` payload parsed as JSON, or the trimmed raw text when it
    /// is not valid JSON.
    pub data: Value,
}

/// Frames decoded by one [`feed`] call and the text to carry into the next.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feed {
    pub frames: Vec<SseFrame>,
    pub remainder: String,
}

/// Append `fragment` to `buffer` and decode every complete frame.
///
/// The final segment is returned as `remainder` and must be passed back as
/// `buffer` on the next call.
pub fn feed(buffer: &str, fragment: &str) -> Feed {
    let mut accumulated = String::with_capacity(buffer.len() + fragment.len());
    accumulated.push_str(buffer);
    accumulated.push_str(fragment);
    let accumulated = normalize_line_endings(&accumulated);

    let mut segments: Vec<&str> = accumulated.split(FRAME_TERMINATOR).collect();
    let remainder = segments.pop().unwrap_or_default().to_string();

    Feed {
        frames: segments.into_iter().filter_map(parse_frame).collect(),
        remainder,
    }
}

/// Decode a leftover remainder at end of stream by treating it as a
/// complete frame.
pub fn flush(remainder: &str) -> Vec<SseFrame> {
    if remainder.trim().is_empty() {
        return Vec::new();
    }
    feed(remainder, FRAME_TERMINATOR).frames
}

/// Parse one frame. Returns `None` when the frame has no `data:` line, or
/// when its data decodes to JSON `null`.
pub fn parse_frame(block: &str) -> Option<SseFrame> {
    let mut event = DEFAULT_EVENT_NAME.to_string();
    let mut data: Option<Value> = None;

    for line in block.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim().to_string();
        } else if let Some(payload) = line.strip_prefix("data:") {
            data = Some(decode_data(payload));
        }
    }

    match data {
        Some(Value::Null) | None => None,
        Some(data) => {
            debug!(event = %event, "decoded stream frame");
            Some(SseFrame { event, data })
        }
    }
}

/// Parse `data:` text as JSON, falling back to the trimmed raw string.
pub fn decode_data(raw: &str) -> Value {
    let trimmed = raw.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn normalize_line_endings(text: &str) -> std::borrow::Cow<'_, str> {
    if text.contains("\r\n") {
        std::borrow::Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        std::borrow::Cow::Borrowed(text)
    }
}

/// Stateful wrapper around [`feed`] that owns the carry-over buffer.
#[derive(Debug, Default, Clone)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment and return the frames it completed, in order.
    pub fn push(&mut self, fragment: &str) -> Vec<SseFrame> {
        let fed = feed(&self.buffer, fragment);
        self.buffer = fed.remainder;
        fed.frames
    }

    /// Text held back waiting for a frame terminator.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// End of stream: decode whatever is left as a final frame.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let remainder = std::mem::take(&mut self.buffer);
        flush(&remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TWO_FRAMES: &str = "event: started\ndata: {\"trace_id\":\"t1\",\"payload\":{}}\n\n\
                              event: step\ndata: {\"service\":\"validator\",\"output\":\"ok ✓\"}\n\n";

    fn decode_all(fragments: &[&str]) -> Vec<SseFrame> {
        let mut decoder = SseDecoder::new();
        let mut frames: Vec<SseFrame> = fragments.iter().flat_map(|f| decoder.push(f)).collect();
        frames.extend(decoder.finish());
        frames
    }

    #[test]
    fn test_two_complete_frames_in_one_fragment() {
        let frames = decode_all(&[TWO_FRAMES]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "started");
        assert_eq!(frames[0].data["trace_id"], "t1");
        assert_eq!(frames[1].event, "step");
        assert_eq!(frames[1].data["output"], "ok ✓");
    }

    #[test]
    fn test_split_at_every_offset_matches_single_fragment() {
        let whole = decode_all(&[TWO_FRAMES]);
        for (offset, _) in TWO_FRAMES.char_indices() {
            let (head, tail) = TWO_FRAMES.split_at(offset);
            assert_eq!(decode_all(&[head, tail]), whole, "split at byte {offset}");
        }
    }

    #[test]
    fn test_last_segment_is_held_back() {
        let fed = feed("", "event: step\ndata: {\"service\":\"a\"}\n\nevent: done\ndata: {");
        assert_eq!(fed.frames.len(), 1);
        assert_eq!(fed.remainder, "event: done\ndata: {");

        let fed = feed(&fed.remainder, "\"trace_id\":\"t\"}\n\n");
        assert_eq!(fed.frames.len(), 1);
        assert_eq!(fed.frames[0].event, "done");
        assert_eq!(fed.remainder, "");
    }

    #[test]
    fn test_invalid_json_falls_back_to_trimmed_text() {
        let fed = feed("", "event: error\ndata:   {not json   \n\n");
        assert_eq!(fed.frames[0].data, json!("{not json"));
    }

    #[test]
    fn test_default_event_name_and_missing_data() {
        let fed = feed("", "data: 1\n\nevent: step\n\n: comment\n\n");
        assert_eq!(fed.frames.len(), 1);
        assert_eq!(fed.frames[0].event, DEFAULT_EVENT_NAME);
        assert_eq!(fed.frames[0].data, json!(1));
    }

    #[test]
    fn test_null_data_yields_nothing() {
        assert!(feed("", "event: step\ndata: null\n\n").frames.is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push("event: done\ndata: {\"trace_id\":\"t9\"}").is_empty());
        assert!(!decoder.pending().is_empty());

        let frames = decoder.finish();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data["trace_id"], "t9");
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn test_finish_without_data_yields_nothing() {
        let mut decoder = SseDecoder::new();
        decoder.push("event: done\n");
        assert!(decoder.finish().is_empty());
        assert!(SseDecoder::new().finish().is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let frames = decode_all(&["event: step\r\ndata: \"x\"\r", "\n\r\n"]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "step");
        assert_eq!(frames[0].data, json!("x"));
    }
}
