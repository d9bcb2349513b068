//! Token estimation shared by resolution and optimization.
//!
//! Both engines hold the same [`TokenEstimator`], so "N tokens" means the same
//! thing when metadata is computed and when the optimizer checks its budget.

use super::types::{FileEntry, SymbolEntry};

/// Characters per token used by the default estimator.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Fixed per-symbol cost added on top of the symbol's text.
pub const SYMBOL_OVERHEAD_TOKENS: usize = 10;

/// Estimates how many LLM tokens a piece of text occupies.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;

    /// Estimated cost of a file entry's content.
    fn file_tokens(&self, file: &FileEntry) -> usize {
        self.estimate(&file.content)
    }

    /// Estimated cost of a symbol: its text plus [`SYMBOL_OVERHEAD_TOKENS`].
    fn symbol_tokens(&self, symbol: &SymbolEntry) -> usize {
        self.estimate(&symbol.cost_text()) + SYMBOL_OVERHEAD_TOKENS
    }
}

/// Fixed characters-per-token heuristic: `ceil(chars / chars_per_token)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRatioEstimator {
    chars_per_token: usize,
}

impl CharRatioEstimator {
    /// Create an estimator. A ratio of zero is treated as one.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}
