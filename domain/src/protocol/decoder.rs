//! Inbound stream decoding.
//!
//! [`ReplyDecoder`] turns raw stdout bytes into text for live display and
//! recognises where a reply ends. It owns the output buffer for one turn.

use super::codec::find_reply_boundary;

/// Result of feeding one chunk of engine output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedChunk {
    /// Text decoded from this chunk, for live display. May be empty when the
    /// chunk only carried the start of a multi-byte character.
    pub raw: String,
    /// Completed reply, present when this chunk closed a turn.
    pub reply: Option<String>,
}

/// Accumulates engine output until a reply boundary shows up.
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    buffer: String,
    /// Bytes of a UTF-8 sequence split across chunks.
    pending: Vec<u8>,
}

impl ReplyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk read from the engine's output stream.
    ///
    /// The decoded text is appended to the buffer. When the buffer contains a
    /// boundary, the text before it is returned trimmed as the reply and the
    /// buffer is cleared, including anything after the marker.
    pub fn feed(&mut self, bytes: &[u8]) -> DecodedChunk {
        let raw = self.decode_utf8(bytes);
        let scan_from = self.scan_start();
        self.buffer.push_str(&raw);

        let reply = find_reply_boundary(&self.buffer[scan_from..]).map(|offset| {
            let reply = self.buffer[..scan_from + offset].trim().to_string();
            self.buffer.clear();
            reply
        });

        DecodedChunk { raw, reply }
    }

    /// Drop everything accumulated so far.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pending.clear();
    }

    /// Where the boundary search resumes: text already scanned holds no
    /// boundary, except one whose line break is the last byte so far.
    fn scan_start(&self) -> usize {
        if self.buffer.ends_with('\n') {
            self.buffer.len() - 1
        } else {
            self.buffer.len()
        }
    }

    /// Text accumulated since the last boundary or reset.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_emitted_once_after_marker() {
        let mut decoder = ReplyDecoder::new();

        let first = decoder.feed(b"partial");
        assert_eq!(first.raw, "partial");
        assert_eq!(first.reply, None);

        let second = decoder.feed(b" answer\n");
        assert_eq!(second.reply, None);

        let third = decoder.feed(b"> ");
        assert_eq!(third.reply.as_deref(), Some("partial answer"));
        assert_eq!(decoder.buffered(), "");

        // Nothing left to complete.
        let fourth = decoder.feed(b"");
        assert_eq!(fourth.reply, None);
    }

    #[test]
    fn test_reply_is_trimmed() {
        let mut decoder = ReplyDecoder::new();
        let chunk = decoder.feed(b"\n  The answer is 4.  \n> ");
        assert_eq!(chunk.reply.as_deref(), Some("The answer is 4."));
    }

    #[test]
    fn test_text_after_marker_is_discarded() {
        let mut decoder = ReplyDecoder::new();
        let chunk = decoder.feed(b"done\n> trailing");
        assert_eq!(chunk.reply.as_deref(), Some("done"));
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_multiline_reply_kept_whole() {
        let mut decoder = ReplyDecoder::new();
        let chunk = decoder.feed(b"line one\nline two\n> ");
        assert_eq!(chunk.reply.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_split_multibyte_character() {
        let mut decoder = ReplyDecoder::new();
        let bytes = "héllo".as_bytes();
        // 'é' is two bytes; split between them.
        let first = decoder.feed(&bytes[..2]);
        assert_eq!(first.raw, "h");
        let second = decoder.feed(&bytes[2..]);
        assert_eq!(second.raw, "éllo");
        assert_eq!(decoder.buffered(), "héllo");
    }

    #[test]
    fn test_invalid_bytes_replaced() {
        let mut decoder = ReplyDecoder::new();
        let chunk = decoder.feed(&[b'a', 0xFF, b'b']);
        assert_eq!(chunk.raw, "a\u{FFFD}b");
    }

    #[test]
    fn test_reset_clears_buffer() {
        let mut decoder = ReplyDecoder::new();
        decoder.feed(b"stale output\n");
        decoder.reset();
        let chunk = decoder.feed(b"fresh\n> ");
        assert_eq!(chunk.reply.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_boundary_found_after_many_chunks() {
        let mut decoder = ReplyDecoder::new();
        for i in 0..200 {
            let chunk = decoder.feed(format!("token{} ", i).as_bytes());
            assert_eq!(chunk.reply, None);
        }
        assert_eq!(decoder.feed("naïve\n".as_bytes()).reply, None);
        let chunk = decoder.feed(b"> ");
        let reply = chunk.reply.unwrap();
        assert!(reply.starts_with("token0 token1"));
        assert!(reply.ends_with("token199 naïve"));
    }

    #[test]
    fn test_marker_earlier_in_line_is_not_a_boundary() {
        let mut decoder = ReplyDecoder::new();
        assert_eq!(decoder.feed(b"a > b").reply, None);
        assert_eq!(decoder.feed(b" -> c").reply, None);
        assert_eq!(decoder.feed("é\n".as_bytes()).reply, None);
        assert_eq!(decoder.feed(b">").reply.as_deref(), Some("a > b -> cé"));
    }

    #[test]
    fn test_boundary_split_across_chunks() {
        let mut decoder = ReplyDecoder::new();
        assert_eq!(decoder.feed(b"reply\n").reply, None);
        assert_eq!(decoder.feed(b">").reply.as_deref(), Some("reply"));
    }
}
