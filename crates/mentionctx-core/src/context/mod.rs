//! Context data model: what a resolution produces and an optimization shrinks.
//!
//! ## Layout
//!
//! ```text
//! ResolvedContext
//! ├── files        Vec<FileEntry>        one per path
//! ├── diagnostics  Vec<DiagnosticEntry>  duplicates kept, in order
//! ├── symbols      Vec<SymbolEntry>      one per (name, file, line)
//! ├── git          Option<GitSnapshot>   last `diff` mention wins
//! ├── raw_notes    Option<String>
//! ├── warnings     Vec<ResolutionWarning>
//! └── metadata     ContextMetadata       derived, never edited by hand
//! ```
//!
//! Token counts come from a single [`TokenEstimator`] shared by the resolver and
//! the optimizer.

pub mod estimate;
pub mod language;
pub mod resolved;
pub mod types;

pub use estimate::{CharRatioEstimator, SYMBOL_OVERHEAD_TOKENS, TokenEstimator};
pub use language::Language;
pub use resolved::{ContextMetadata, ResolvedContext, token_total};
pub use types::{
    ChangedFile, DiagnosticEntry, FileEntry, GitSnapshot, GitStatus, Severity, SymbolEntry,
    SymbolKind,
};
