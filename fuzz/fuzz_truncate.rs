//! Fuzz target for line truncation.
//!
//! Run with: cargo +nightly fuzz run fuzz_truncate
//!
//! A truncated file holds exactly one marker and never more lines than the
//! input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mentionctx_core::optimize::{Heuristics, truncate};

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    if let Some(out) = truncate::truncate_lines(content, &Heuristics::default()) {
        assert_eq!(truncate::marker_count(&out), 1);
        assert!(out.lines().count() <= content.lines().count());
    }
});
