//! Turn protocol between the supervisor and the engine process.
//!
//! The engine speaks plain lines: one prompt per input line, free-form text
//! on output, and an interactive-prompt marker when it wants the next line.
//!
//! - [`codec::encode_prompt`] - multi-line text to one input line
//! - [`codec::find_reply_boundary`] - the end-of-reply heuristic
//! - [`decoder::ReplyDecoder`] - per-turn output buffer

pub mod codec;
pub mod decoder;
