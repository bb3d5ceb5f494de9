//! Byte-to-text conversion that survives multi-byte characters split across
//! network reads.

/// Carries an incomplete trailing UTF-8 sequence into the next chunk.
#[derive(Debug, Default, Clone)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk` together with any bytes held back from the previous
    /// call. An incomplete sequence at the end is held back; invalid bytes
    /// become U+FFFD.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// End of input: whatever is still held back is decoded lossily.
    pub fn finish(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_character() {
        let bytes = "ok ✓ done".as_bytes();
        let check = bytes.iter().position(|b| *b == 0xE2).unwrap();

        let mut carry = Utf8Carry::new();
        let mut text = carry.decode(&bytes[..check + 1]);
        text.push_str(&carry.decode(&bytes[check + 1..]));
        text.push_str(&carry.finish());
        assert_eq!(text, "ok ✓ done");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut carry = Utf8Carry::new();
        let text = carry.decode(&[b'a', 0xFF, b'b']);
        assert_eq!(text, "a\u{FFFD}b");
    }

    #[test]
    fn test_invalid_byte_and_split_character_in_one_chunk() {
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(&[b'a', 0xFF, b'b', 0xE2, 0x9C]), "a\u{FFFD}b");
        assert_eq!(carry.decode(&[0x93, b'!']), "✓!");
        assert_eq!(carry.finish(), "");
    }

    #[test]
    fn test_truncated_sequence_at_end_of_input() {
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(&[b'x', 0xE2, 0x9C]), "x");
        assert_eq!(carry.finish(), "\u{FFFD}");
    }
}
