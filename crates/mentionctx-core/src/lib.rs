#![deny(unsafe_code)]

//! mentionctx core: mention resolution and token-budget optimization.
//!
//! Given a list of parsed mention tokens (`@file:src/app.ts`, `@errors`,
//! `@diff`, `@function:main`, ...), the [`Resolver`] gathers the referenced
//! material from pluggable [`Providers`] into one deduplicated
//! [`ResolvedContext`]. The [`Optimizer`] then shrinks that context, in a
//! fixed and deterministic order of lossy stages, until its estimated token
//! count fits a budget.
//!
//! The core never reads files or runs processes itself; concrete providers
//! live with the caller (see the `mentionctx` CLI for local ones).

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, the return type for async
/// trait methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits produces opaque return types that are **not**
/// object-safe. Provider traits are consumed as `Arc<dyn Trait>`, so they
/// return a concrete `Pin<Box<dyn Future>>` instead.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Context data model and token estimation.
pub mod context;
/// Mention tokens and their typed interpretation.
pub mod mention;
/// Budget-driven context reduction.
pub mod optimize;
/// Capability traits and the provider set.
pub mod provider;
/// Token-to-context resolution and deduplication.
pub mod resolve;

pub use context::{
    CharRatioEstimator, ContextMetadata, FileEntry, Language, ResolvedContext, SymbolEntry,
    SymbolKind, TokenEstimator,
};
pub use mention::{LineRange, Mention, MentionToken};
pub use optimize::{Heuristics, OptimizationStrategy, OptimizeError, Optimizer, optimize};
pub use provider::{
    Diagnostics, FileAccess, FileStat, MentionProvider, ProviderError, Providers, SymbolLookup,
    VersionControl,
};
pub use resolve::{
    Contribution, ResolutionWarning, ResolveError, Resolver, ResolverSettings, resolve,
};
