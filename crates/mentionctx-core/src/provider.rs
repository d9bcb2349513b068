//! Provider capabilities: the narrow interfaces the resolver consumes.
//!
//! The core never reads files, runs git, or talks to a language server itself.
//! Each of those concerns sits behind a capability trait, and a [`Providers`]
//! set holds at most one implementation of each, plus per-kind
//! [`MentionProvider`]s for mention kinds the core has no built-in resolver
//! for (or wants overridden).
//!
//! All traits return [`BoxFuture`] so they stay object-safe behind `Arc<dyn _>`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BoxFuture;
use crate::context::{
    ChangedFile, CharRatioEstimator, DiagnosticEntry, SymbolEntry, SymbolKind, TokenEstimator,
};
use crate::mention::{DiffOptions, MentionToken};
use crate::resolve::Contribution;

/// Errors reported by provider implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider error: {0}")]
    Other(String),
}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ProviderError::NotFound(e.to_string()),
            _ => ProviderError::Io(e.to_string()),
        }
    }
}

/// Size and modification time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Read access to files.
pub trait FileAccess: Send + Sync {
    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, ProviderError>>;

    /// Paths matching a glob pattern such as `src/*` or `src/**/*`.
    fn list<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>>;

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<FileStat, ProviderError>>;
}

/// Version-control state.
pub trait VersionControl: Send + Sync {
    fn diff<'a>(&'a self, options: &'a DiffOptions) -> BoxFuture<'a, Result<String, ProviderError>>;

    fn changed_files(&self) -> BoxFuture<'_, Result<Vec<ChangedFile>, ProviderError>>;

    fn current_branch(&self) -> BoxFuture<'_, Result<String, ProviderError>>;
}

/// Compiler / linter diagnostics.
pub trait Diagnostics: Send + Sync {
    /// Diagnostics for one file, or for the whole workspace when `path` is `None`.
    fn for_file<'a>(
        &'a self,
        path: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<DiagnosticEntry>, ProviderError>>;
}

/// Symbol search and navigation.
pub trait SymbolLookup: Send + Sync {
    fn find<'a>(
        &'a self,
        name: &'a str,
        kind: Option<SymbolKind>,
    ) -> BoxFuture<'a, Result<Vec<SymbolEntry>, ProviderError>>;

    fn definition_at<'a>(
        &'a self,
        file: &'a str,
        line: u32,
        column: u32,
    ) -> BoxFuture<'a, Result<Option<SymbolEntry>, ProviderError>>;

    fn references_at<'a>(
        &'a self,
        file: &'a str,
        line: u32,
        column: u32,
    ) -> BoxFuture<'a, Result<Vec<SymbolEntry>, ProviderError>>;
}

/// Resolves every token of one mention kind, bypassing the built-in resolvers.
pub trait MentionProvider: Send + Sync {
    fn resolve<'a>(
        &'a self,
        token: &'a MentionToken,
    ) -> BoxFuture<'a, Result<Contribution, ProviderError>>;
}

/// The set of providers a resolution runs against.
#[derive(Clone)]
pub struct Providers {
    files: Option<Arc<dyn FileAccess>>,
    vcs: Option<Arc<dyn VersionControl>>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
    symbols: Option<Arc<dyn SymbolLookup>>,
    custom: HashMap<String, Arc<dyn MentionProvider>>,
    estimator: Arc<dyn TokenEstimator>,
}

impl Providers {
    /// An empty set using the default 4-chars-per-token estimator.
    pub fn new() -> Self {
        Self {
            files: None,
            vcs: None,
            diagnostics: None,
            symbols: None,
            custom: HashMap::new(),
            estimator: Arc::new(CharRatioEstimator::default()),
        }
    }

    pub fn with_files(mut self, files: Arc<dyn FileAccess>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_vcs(mut self, vcs: Arc<dyn VersionControl>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn with_symbols(mut self, symbols: Arc<dyn SymbolLookup>) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Register a provider for a mention kind. Replaces any earlier one.
    pub fn register(mut self, kind: impl Into<String>, provider: Arc<dyn MentionProvider>) -> Self {
        self.custom.insert(kind.into(), provider);
        self
    }

    pub fn files(&self) -> Option<&dyn FileAccess> {
        self.files.as_deref()
    }

    pub fn vcs(&self) -> Option<&dyn VersionControl> {
        self.vcs.as_deref()
    }

    pub fn diagnostics(&self) -> Option<&dyn Diagnostics> {
        self.diagnostics.as_deref()
    }

    pub fn symbols(&self) -> Option<&dyn SymbolLookup> {
        self.symbols.as_deref()
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    /// Owned handle to the estimator, for an optimizer that must count the
    /// same way this resolution did.
    pub fn shared_estimator(&self) -> Arc<dyn TokenEstimator> {
        Arc::clone(&self.estimator)
    }

    /// The provider registered for `kind`, if any.
    pub fn custom(&self, kind: &str) -> Option<&dyn MentionProvider> {
        self.custom.get(kind).map(|p| p.as_ref())
    }

    /// Registered custom kinds, sorted.
    pub fn registered_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<_> = self.custom.keys().map(String::as_str).collect();
        kinds.sort();
        kinds
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("files", &self.files.is_some())
            .field("vcs", &self.vcs.is_some())
            .field("diagnostics", &self.diagnostics.is_some())
            .field("symbols", &self.symbols.is_some())
            .field("custom", &self.registered_kinds())
            .finish()
    }
}
