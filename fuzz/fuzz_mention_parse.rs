//! Fuzz target for mention token interpretation.
//!
//! Run with: cargo +nightly fuzz run fuzz_mention_parse
//!
//! Decodes arbitrary JSON into a `MentionToken` and interprets it. Parsing may
//! reject a token but must never panic, and any parsed line range must be
//! 1-indexed with `start <= end`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mentionctx_core::{LineRange, Mention, MentionToken};

fuzz_target!(|data: &[u8]| {
    let Ok(token) = serde_json::from_slice::<MentionToken>(data) else {
        return;
    };
    if let Ok(Mention::File {
        lines: Some(range), ..
    }) = Mention::parse(&token)
    {
        assert!(range.start >= 1 && range.start <= range.end);
    }
    if let Some(lines) = token.param("lines")
        && let Some(range) = LineRange::parse(lines)
    {
        assert!(range.start >= 1 && range.start <= range.end);
    }
});
