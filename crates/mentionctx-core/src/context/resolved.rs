//! The aggregate root handed back to callers, and its derived metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::estimate::TokenEstimator;
use super::types::{DiagnosticEntry, FileEntry, GitSnapshot, SymbolEntry};
use crate::resolve::ResolutionWarning;

/// Lines a reader gets through per minute, for the reading-time estimate.
pub const LINES_PER_MINUTE: usize = 50;

/// Statistics derived from a context's contents.
///
/// Only [`ContextMetadata::compute`] produces these; they are never edited
/// independently of the lists they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    /// Estimated tokens across file contents and symbols.
    pub token_count: usize,
    pub file_count: usize,
    pub symbol_count: usize,
    pub diagnostic_count: usize,
    pub generated_at: DateTime<Utc>,
    pub estimated_reading_time_minutes: usize,
}

impl ContextMetadata {
    pub fn compute(
        files: &[FileEntry],
        symbols: &[SymbolEntry],
        diagnostics: &[DiagnosticEntry],
        estimator: &dyn TokenEstimator,
    ) -> Self {
        let total_lines: usize = files.iter().map(FileEntry::line_count).sum();

        Self {
            token_count: token_total(files, symbols, estimator),
            file_count: files.len(),
            symbol_count: symbols.len(),
            diagnostic_count: diagnostics.len(),
            generated_at: Utc::now(),
            estimated_reading_time_minutes: total_lines.div_ceil(LINES_PER_MINUTE),
        }
    }
}

/// Tokens that count toward a budget: file contents plus symbols.
///
/// Diagnostics, the git snapshot, and raw notes are not counted.
pub fn token_total(
    files: &[FileEntry],
    symbols: &[SymbolEntry],
    estimator: &dyn TokenEstimator,
) -> usize {
    let file_tokens: usize = files.iter().map(|f| estimator.file_tokens(f)).sum();
    let symbol_tokens: usize = symbols.iter().map(|s| estimator.symbol_tokens(s)).sum();
    file_tokens + symbol_tokens
}

/// Files, diagnostics, symbols, and git state gathered for a set of mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContext {
    pub files: Vec<FileEntry>,
    pub diagnostics: Vec<DiagnosticEntry>,
    pub symbols: Vec<SymbolEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_notes: Option<String>,
    /// One entry per mention that contributed nothing because it failed.
    #[serde(default)]
    pub warnings: Vec<ResolutionWarning>,
    pub metadata: ContextMetadata,
}

impl ResolvedContext {
    /// An empty context with freshly computed (all-zero) metadata.
    pub fn empty() -> Self {
        Self::from_parts(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            None,
            None,
            Vec::new(),
            &super::estimate::CharRatioEstimator::default(),
        )
    }

    /// Assemble a context, computing its metadata from the given parts.
    pub fn from_parts(
        files: Vec<FileEntry>,
        diagnostics: Vec<DiagnosticEntry>,
        symbols: Vec<SymbolEntry>,
        git: Option<GitSnapshot>,
        raw_notes: Option<String>,
        warnings: Vec<ResolutionWarning>,
        estimator: &dyn TokenEstimator,
    ) -> Self {
        let metadata = ContextMetadata::compute(&files, &symbols, &diagnostics, estimator);
        Self {
            files,
            diagnostics,
            symbols,
            git,
            raw_notes,
            warnings,
            metadata,
        }
    }

    /// Recompute [`ContextMetadata`] after the lists have changed.
    pub fn refresh_metadata(&mut self, estimator: &dyn TokenEstimator) {
        self.metadata =
            ContextMetadata::compute(&self.files, &self.symbols, &self.diagnostics, estimator);
    }

    /// Look up a file entry by path.
    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.symbols.is_empty()
            && self.diagnostics.is_empty()
            && self.git.is_none()
            && self.raw_notes.is_none()
    }
}

impl Default for ResolvedContext {
    fn default() -> Self {
        Self::empty()
    }
}
