#![deny(unsafe_code)]

//! Shared test utilities for the mentionctx workspace.
//!
//! Provides in-memory providers, mention-token and config builders, and
//! tracing helpers so that individual crate tests stay concise and
//! consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! mentionctx-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod providers;
pub mod tokens;
pub mod tracing_setup;

pub use providers::{FailingFiles, MockDiagnostics, MockFiles, MockSymbols, MockVcs};
pub use tokens::TokenBuilder;
