//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! Feeds arbitrary text to `AppConfig::parse()`. Anything that parses must
//! also pass validation and survive a round trip through TOML.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mentionctx_config::AppConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = AppConfig::parse(s) {
        assert!(config.validate().is_ok());
        if let Ok(text) = toml::to_string(&config) {
            assert!(AppConfig::parse(&text).is_ok());
        }
    }
});
