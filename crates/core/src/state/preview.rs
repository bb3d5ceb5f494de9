//! Payload preview policy for stage input/output.
//!
//! Given a value and its declared payload type, produce what a view shows
//! next to the stage. The rules are deterministic so every view adapter
//! renders the same preview.

use std::fmt;
use tr_protocol::PayloadType;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "…";

/// Shown when there is no value.
pub const NO_VALUE: &str = "—";

const TEXT_LIMIT: usize = 80;
const JSON_LIMIT: usize = 120;
const TAG_THRESHOLD: usize = 60;

/// Rendered preview of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Preview {
    /// Empty or absent value.
    #[default]
    Empty,

    /// Base64 media that a capable view can render as an image or video.
    Media { kind: PayloadType, base64: String },

    /// Display text.
    Text(String),
}

impl Preview {
    /// Apply the preview policy to `value` declared as `payload_type`.
    pub fn of(value: Option<&str>, payload_type: PayloadType) -> Self {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return Preview::Empty;
        };

        if payload_type.is_media() && is_base64(value) {
            return Preview::Media {
                kind: payload_type,
                base64: value.to_string(),
            };
        }

        match payload_type {
            PayloadType::Json => match serde_json::from_str::<serde_json::Value>(value) {
                Ok(parsed) => {
                    let pretty =
                        serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| value.to_string());
                    Preview::Text(truncate(&pretty, JSON_LIMIT))
                }
                Err(_) => Preview::Text(truncate(value, TEXT_LIMIT)),
            },
            PayloadType::Binary | PayloadType::Image | PayloadType::Video => {
                let length = value.chars().count();
                if length > TAG_THRESHOLD {
                    Preview::Text(format!("[{payload_type}] {length} chars"))
                } else {
                    Preview::Text(format!("[{payload_type}]"))
                }
            }
            PayloadType::Text | PayloadType::Any => Preview::Text(truncate(value, TEXT_LIMIT)),
        }
    }

    /// Plain text preview, truncated like a `text` payload.
    pub fn text(value: &str) -> Self {
        Self::of(Some(value), PayloadType::Text)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Preview::Empty)
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preview::Empty => f.write_str(NO_VALUE),
            Preview::Media { kind, base64 } => {
                write!(f, "[{kind}] {} chars base64", base64.chars().count())
            }
            Preview::Text(text) => f.write_str(text),
        }
    }
}

/// Whether `value` consists only of base64 alphabet characters.
pub fn is_base64(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

/// First `limit` characters, with [`ELLIPSIS`] when anything was cut.
pub fn truncate(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &value[..cut]),
        None => value.to_string(),
    }
}
