//! In-memory provider implementations.
//!
//! Each mock holds canned data and records the calls it receives, so tests
//! can assert both on what a resolution produced and on the order in which
//! providers were consulted.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use mentionctx_core::BoxFuture;
use mentionctx_core::context::{ChangedFile, DiagnosticEntry, SymbolEntry, SymbolKind};
use mentionctx_core::mention::DiffOptions;
use mentionctx_core::provider::{
    Diagnostics, FileAccess, FileStat, ProviderError, SymbolLookup, VersionControl,
};

/// Shared, append-only record of calls made to a mock.
pub type CallLog = Arc<Mutex<Vec<String>>>;

fn record(log: &CallLog, call: String) {
    log.lock().expect("call log poisoned").push(call);
}

// ── Files ───────────────────────────────────────────────────────────────────

/// An in-memory file tree.
#[derive(Default)]
pub struct MockFiles {
    files: BTreeMap<String, String>,
    modified: HashMap<String, DateTime<Utc>>,
    unreadable: HashSet<String>,
    no_stat: bool,
    calls: CallLog,
}

impl MockFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_modified(mut self, path: &str, at: DateTime<Utc>) -> Self {
        self.modified.insert(path.to_string(), at);
        self
    }

    /// Listed by `list`, but every `read` of it fails.
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.files.insert(path.to_string(), String::new());
        self.unreadable.insert(path.to_string());
        self
    }

    /// Make every `stat` call fail.
    pub fn without_stat(mut self) -> Self {
        self.no_stat = true;
        self
    }

    /// Handle to the call log (`read:<path>`, `list:<pattern>`, `stat:<path>`).
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl FileAccess for MockFiles {
    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, format!("read:{path}"));
            if self.unreadable.contains(path) {
                return Err(ProviderError::Io(format!("permission denied: {path}")));
            }
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(path.to_string()))
        })
    }

    fn list<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, format!("list:{pattern}"));
            let pattern =
                Pattern::new(pattern).map_err(|e| ProviderError::Other(e.to_string()))?;
            let options = MatchOptions {
                require_literal_separator: true,
                ..MatchOptions::new()
            };
            Ok(self
                .files
                .keys()
                .filter(|path| pattern.matches_with(path, options))
                .cloned()
                .collect())
        })
    }

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<FileStat, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, format!("stat:{path}"));
            if self.no_stat {
                return Err(ProviderError::Unavailable("stat disabled".to_string()));
            }
            let content = self
                .files
                .get(path)
                .ok_or_else(|| ProviderError::NotFound(path.to_string()))?;
            Ok(FileStat {
                size: content.len() as u64,
                last_modified: self.modified.get(path).copied(),
            })
        })
    }
}

/// A file provider whose every call fails.
pub struct FailingFiles {
    error: ProviderError,
}

impl FailingFiles {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

impl Default for FailingFiles {
    fn default() -> Self {
        Self::new(ProviderError::Unavailable("file system offline".to_string()))
    }
}

impl FileAccess for FailingFiles {
    fn read<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move { Err(self.error.clone()) })
    }

    fn list<'a>(&'a self, _pattern: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move { Err(self.error.clone()) })
    }

    fn stat<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, Result<FileStat, ProviderError>> {
        Box::pin(async move { Err(self.error.clone()) })
    }
}

// ── Version control ─────────────────────────────────────────────────────────

/// Canned version-control state.
pub struct MockVcs {
    branch: String,
    diff: String,
    staged_diff: String,
    changed: Vec<ChangedFile>,
    calls: CallLog,
}

impl MockVcs {
    pub fn new(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            diff: String::new(),
            staged_diff: String::new(),
            changed: Vec::new(),
            calls: CallLog::default(),
        }
    }

    pub fn with_diff(mut self, diff: &str) -> Self {
        self.diff = diff.to_string();
        self
    }

    pub fn with_staged_diff(mut self, diff: &str) -> Self {
        self.staged_diff = diff.to_string();
        self
    }

    pub fn with_change(mut self, change: ChangedFile) -> Self {
        self.changed.push(change);
        self
    }

    /// Handle to the call log (`diff`, `diff:staged`, `changed_files`, `branch`).
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl VersionControl for MockVcs {
    fn diff<'a>(
        &'a self,
        options: &'a DiffOptions,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let diff = if options.staged {
                record(&self.calls, "diff:staged".to_string());
                &self.staged_diff
            } else {
                record(&self.calls, "diff".to_string());
                &self.diff
            };
            match &options.file {
                Some(file) => Ok(diff
                    .split_inclusive('\n')
                    .filter(|line| line.contains(file.as_str()))
                    .collect()),
                None => Ok(diff.clone()),
            }
        })
    }

    fn changed_files(&self) -> BoxFuture<'_, Result<Vec<ChangedFile>, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, "changed_files".to_string());
            Ok(self.changed.clone())
        })
    }

    fn current_branch(&self) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, "branch".to_string());
            Ok(self.branch.clone())
        })
    }
}

// ── Diagnostics ─────────────────────────────────────────────────────────────

/// A fixed list of diagnostics, filtered by file on request.
#[derive(Default)]
pub struct MockDiagnostics {
    entries: Vec<DiagnosticEntry>,
}

impl MockDiagnostics {
    pub fn new(entries: Vec<DiagnosticEntry>) -> Self {
        Self { entries }
    }
}

impl Diagnostics for MockDiagnostics {
    fn for_file<'a>(
        &'a self,
        path: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<DiagnosticEntry>, ProviderError>> {
        Box::pin(async move {
            Ok(self
                .entries
                .iter()
                .filter(|d| path.is_none_or(|p| d.file == p))
                .cloned()
                .collect())
        })
    }
}

// ── Symbols ─────────────────────────────────────────────────────────────────

/// A symbol table searched by exact name.
#[derive(Default)]
pub struct MockSymbols {
    symbols: Vec<SymbolEntry>,
    references: HashMap<(String, u32), Vec<SymbolEntry>>,
    failing: HashSet<String>,
    calls: CallLog,
}

impl MockSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: SymbolEntry) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// References returned for a lookup at `(file, line)`.
    pub fn with_references(mut self, file: &str, line: u32, refs: Vec<SymbolEntry>) -> Self {
        self.references.insert((file.to_string(), line), refs);
        self
    }

    /// Make `find` fail for `name`.
    pub fn with_failing_lookup(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Handle to the call log (`find:<name>`, `definition:<file>:<line>`, ...).
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl SymbolLookup for MockSymbols {
    fn find<'a>(
        &'a self,
        name: &'a str,
        kind: Option<SymbolKind>,
    ) -> BoxFuture<'a, Result<Vec<SymbolEntry>, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, format!("find:{name}"));
            if self.failing.contains(name) {
                return Err(ProviderError::Unavailable(format!("index lost {name}")));
            }
            Ok(self
                .symbols
                .iter()
                .filter(|s| s.name == name && kind.is_none_or(|k| s.kind == k))
                .cloned()
                .collect())
        })
    }

    fn definition_at<'a>(
        &'a self,
        file: &'a str,
        line: u32,
        _column: u32,
    ) -> BoxFuture<'a, Result<Option<SymbolEntry>, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, format!("definition:{file}:{line}"));
            Ok(self
                .symbols
                .iter()
                .find(|s| s.file == file && s.line == line)
                .cloned())
        })
    }

    fn references_at<'a>(
        &'a self,
        file: &'a str,
        line: u32,
        _column: u32,
    ) -> BoxFuture<'a, Result<Vec<SymbolEntry>, ProviderError>> {
        Box::pin(async move {
            record(&self.calls, format!("references:{file}:{line}"));
            Ok(self
                .references
                .get(&(file.to_string(), line))
                .cloned()
                .unwrap_or_default())
        })
    }
}
