//! Resolution engine: turns mention tokens into a [`ResolvedContext`].
//!
//! Tokens are resolved one at a time, in the order given, as a fold over the
//! token list: each token yields a `Result<Contribution, ResolveError>`, a
//! failure becomes a [`ResolutionWarning`] plus an empty contribution, and the
//! contribution is merged into the accumulator before the next token starts.
//! A single dedup pass and a metadata computation run once at the end.
//!
//! ```text
//! tokens ──▶ resolve_token ──▶ Contribution ──merge──▶ accumulator
//!   (in order, one at a time)                             │
//!                                           dedup + metadata
//!                                                         ▼
//!                                                  ResolvedContext
//! ```

mod builtin;
pub mod dedup;

use futures::{StreamExt, future, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::{
    DiagnosticEntry, FileEntry, GitSnapshot, ResolvedContext, SymbolEntry, TokenEstimator,
};
use crate::mention::{DEFAULT_FOLDER_LIMIT, Mention, MentionToken};
use crate::provider::{ProviderError, Providers};

/// Why a single mention contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ResolveError {
    #[error("unknown mention kind: {kind}")]
    UnknownKind { kind: String },

    #[error("invalid `{param}` for {kind} mention: {value:?}")]
    InvalidParam {
        kind: String,
        param: String,
        value: String,
    },

    #[error("no {capability} provider configured")]
    MissingCapability { capability: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A mention that failed to resolve, kept alongside the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionWarning {
    pub kind: String,
    pub raw: String,
    pub reason: ResolveError,
}

/// What one mention adds to the context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contribution {
    pub files: Vec<FileEntry>,
    pub symbols: Vec<SymbolEntry>,
    pub diagnostics: Vec<DiagnosticEntry>,
    pub git: Option<GitSnapshot>,
    pub raw_notes: Option<String>,
    pub warnings: Vec<ResolutionWarning>,
}

impl Contribution {
    pub fn files(files: Vec<FileEntry>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    pub fn symbols(symbols: Vec<SymbolEntry>) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }

    pub fn diagnostics(diagnostics: Vec<DiagnosticEntry>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub fn git(snapshot: GitSnapshot) -> Self {
        Self {
            git: Some(snapshot),
            ..Self::default()
        }
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self {
            raw_notes: Some(text.into()),
            ..Self::default()
        }
    }

    /// The empty contribution of a failed mention, carrying its warning.
    pub fn failed(token: &MentionToken, reason: ResolveError) -> Self {
        Self {
            warnings: vec![ResolutionWarning {
                kind: token.kind.clone(),
                raw: token.raw.clone(),
                reason,
            }],
            ..Self::default()
        }
    }

    /// Append `other` after `self`.
    ///
    /// Lists are concatenated, a present git snapshot replaces the earlier
    /// one, and notes are joined with a newline.
    pub fn merge(mut self, other: Contribution) -> Self {
        self.files.extend(other.files);
        self.symbols.extend(other.symbols);
        self.diagnostics.extend(other.diagnostics);
        if other.git.is_some() {
            self.git = other.git;
        }
        self.raw_notes = match (self.raw_notes, other.raw_notes) {
            (Some(mut a), Some(b)) => {
                a.push('\n');
                a.push_str(&b);
                Some(a)
            }
            (a, b) => a.or(b),
        };
        self.warnings.extend(other.warnings);
        self
    }

    /// Deduplicate and compute metadata.
    pub fn into_context(self, estimator: &dyn TokenEstimator) -> ResolvedContext {
        ResolvedContext::from_parts(
            dedup::dedup_files(self.files),
            self.diagnostics,
            dedup::dedup_symbols(self.symbols),
            self.git,
            self.raw_notes,
            self.warnings,
            estimator,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.symbols.is_empty()
            && self.diagnostics.is_empty()
            && self.git.is_none()
            && self.raw_notes.is_none()
    }
}

/// Tunables for the built-in resolvers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Files read by a folder mention without an explicit `limit=`.
    pub folder_limit: usize,
}

impl ResolverSettings {
    pub fn from_config(config: &mentionctx_config::ResolverConfig) -> Self {
        Self {
            folder_limit: config.folder_limit,
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            folder_limit: DEFAULT_FOLDER_LIMIT,
        }
    }
}

/// Resolves mention tokens against a [`Providers`] set.
#[derive(Debug, Clone)]
pub struct Resolver {
    providers: Providers,
    settings: ResolverSettings,
}

impl Resolver {
    pub fn new(providers: Providers) -> Self {
        Self::with_settings(providers, ResolverSettings::default())
    }

    pub fn with_settings(providers: Providers, settings: ResolverSettings) -> Self {
        Self {
            providers,
            settings,
        }
    }

    /// Resolve `tokens` in order into a fresh context. Never fails as a whole.
    pub async fn resolve(&self, tokens: &[MentionToken]) -> ResolvedContext {
        debug!(tokens = tokens.len(), "Resolving mentions");

        let merged = stream::iter(tokens)
            .then(|token| self.resolve_token(token))
            .fold(Contribution::default(), |acc, next| {
                future::ready(acc.merge(next))
            })
            .await;

        let context = merged.into_context(self.providers.estimator());
        info!(
            files = context.metadata.file_count,
            symbols = context.metadata.symbol_count,
            diagnostics = context.metadata.diagnostic_count,
            tokens = context.metadata.token_count,
            warnings = context.warnings.len(),
            "Mentions resolved"
        );
        context
    }

    /// Resolve a single token. Failures are logged and yield an empty
    /// contribution carrying a [`ResolutionWarning`].
    pub async fn resolve_token(&self, token: &MentionToken) -> Contribution {
        match self.try_resolve(token).await {
            Ok(contribution) => contribution,
            Err(e) => {
                warn!(
                    kind = %token.kind,
                    raw = %token.raw,
                    error = %e,
                    "Mention resolution failed"
                );
                Contribution::failed(token, e)
            }
        }
    }

    async fn try_resolve(&self, token: &MentionToken) -> Result<Contribution, ResolveError> {
        if let Some(provider) = self.providers.custom(&token.kind) {
            debug!(kind = %token.kind, "Dispatching to registered provider");
            return Ok(provider.resolve(token).await?);
        }

        let mention = Mention::parse(token)?;
        builtin::resolve_mention(&self.providers, &self.settings, mention).await
    }
}

/// Resolve `tokens` against `providers` with default settings.
pub async fn resolve(tokens: &[MentionToken], providers: &Providers) -> ResolvedContext {
    Resolver::new(providers.clone()).resolve(tokens).await
}
