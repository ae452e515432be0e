//! Outbound prompt encoding and the reply-boundary heuristic.
//!
//! The engine reads its input one line at a time and submits on every real
//! line break, so a prompt must travel as a single line. Line breaks are
//! replaced with the two-character sequence `\n` (backslash, `n`). The engine
//! is expected to unescape it; a literal backslash-n typed by the user is
//! indistinguishable after encoding. That asymmetry is a known limitation of
//! the line protocol and is left as is.

/// Interactive-prompt character the engine prints when it wants input.
pub const BOUNDARY_MARKER: char = '>';

/// Escape sequence that stands in for a line break inside an encoded prompt.
pub const ESCAPED_LINE_BREAK: &str = "\\n";

/// Encode free-form user text into one protocol-safe line.
///
/// Both `\r\n` and `\n` become [`ESCAPED_LINE_BREAK`]; nothing else changes.
/// The returned string never contains `\n` and does not include the line
/// terminator; the writer appends that.
pub fn encode_prompt(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                encoded.push_str(ESCAPED_LINE_BREAK);
            }
            '\n' => encoded.push_str(ESCAPED_LINE_BREAK),
            other => encoded.push(other),
        }
    }
    encoded
}

/// Locate the end of a reply in accumulated engine output.
///
/// Returns the byte index of the first line break that is immediately
/// followed by [`BOUNDARY_MARKER`]. Everything before that index is the
/// reply.
///
/// False positive: when genuine model output has a line starting with the
/// marker (a markdown quote, a shell prompt in an example), the reply is cut
/// there and the rest is dropped.
pub fn find_reply_boundary(buffer: &str) -> Option<usize> {
    buffer
        .match_indices('\n')
        .map(|(idx, _)| idx)
        .find(|&idx| buffer[idx + 1..].starts_with(BOUNDARY_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_replaces_every_line_break() {
        let encoded = encode_prompt("first line\nsecond line\nthird");
        assert_eq!(encoded, "first line\\nsecond line\\nthird");
        assert!(!encoded.contains('\n'));
    }

    #[test]
    fn test_encode_handles_crlf() {
        let encoded = encode_prompt("a\r\nb\r\n");
        assert_eq!(encoded, "a\\nb\\n");
        assert!(!encoded.contains('\r'));
    }

    #[test]
    fn test_encode_is_identity_without_line_breaks() {
        let text = "what is 2 + 2?";
        assert_eq!(encode_prompt(text), text);
        assert_eq!(encode_prompt(&encode_prompt(text)), text);
    }

    #[test]
    fn test_encode_keeps_lone_carriage_return() {
        assert_eq!(encode_prompt("a\rb"), "a\rb");
    }

    #[test]
    fn test_encode_consecutive_breaks() {
        assert_eq!(encode_prompt("\n\n"), "\\n\\n");
    }

    #[test]
    fn test_boundary_found_after_line_break() {
        assert_eq!(find_reply_boundary("answer\n> "), Some(6));
    }

    #[test]
    fn test_no_boundary_without_marker() {
        assert_eq!(find_reply_boundary("answer\n"), None);
        assert_eq!(find_reply_boundary("partial"), None);
    }

    #[test]
    fn test_marker_mid_line_is_not_a_boundary() {
        assert_eq!(find_reply_boundary("a > b\n"), None);
        assert_eq!(find_reply_boundary("> leading marker with no break"), None);
    }

    #[test]
    fn test_quoted_line_is_a_false_positive() {
        // Documented limitation: a quote line in genuine output ends the reply.
        let buffer = "Here is a quote:\n> be kind\nmore text";
        assert_eq!(find_reply_boundary(buffer), Some(16));
    }
}
