//! File access rooted at a workspace directory.
//!
//! Every path a mention names is interpreted relative to the root. Absolute
//! paths and `..` components are rejected before any I/O happens.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use glob::MatchOptions;
use mentionctx_core::BoxFuture;
use mentionctx_core::provider::{FileAccess, FileStat, ProviderError};
use tracing::debug;

/// Reads files under `root` with `tokio::fs`.
#[derive(Debug, Clone)]
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ProviderError> {
        Ok(self.root.join(confined(path)?))
    }
}

/// `path` as a relative path that cannot leave the root.
fn confined(path: &str) -> Result<&Path, ProviderError> {
    let p = Path::new(path);
    let inside = p
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if inside {
        Ok(p)
    } else {
        Err(ProviderError::Other(format!(
            "path escapes workspace root: {path}"
        )))
    }
}

fn io_error(path: &str, e: io::Error) -> ProviderError {
    match e.kind() {
        io::ErrorKind::NotFound => ProviderError::NotFound(path.to_string()),
        _ => ProviderError::Io(format!("{path}: {e}")),
    }
}

/// `rel` with `/` separators on every platform.
fn to_slash(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn list_blocking(root: &Path, pattern: &str) -> Result<Vec<String>, ProviderError> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let full = format!("{}/{pattern}", base.trim_end_matches('/'));
    let options = MatchOptions {
        require_literal_separator: true,
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let entries = glob::glob_with(&full, options)
        .map_err(|e| ProviderError::Other(format!("invalid pattern {pattern:?}: {e}")))?;

    let mut found = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                if let Ok(rel) = path.strip_prefix(root) {
                    found.push(to_slash(rel));
                }
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Skipping unreadable glob entry"),
        }
    }
    found.sort();
    Ok(found)
}

impl FileAccess for LocalFiles {
    fn read<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let full = self.resolve(path)?;
            tokio::fs::read_to_string(&full)
                .await
                .map_err(|e| io_error(path, e))
        })
    }

    fn list<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            confined(pattern)?;
            let root = self.root.clone();
            let pattern = pattern.to_string();
            tokio::task::spawn_blocking(move || list_blocking(&root, &pattern))
                .await
                .map_err(|e| ProviderError::Other(format!("listing task failed: {e}")))?
        })
    }

    fn stat<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<FileStat, ProviderError>> {
        Box::pin(async move {
            let full = self.resolve(path)?;
            let meta = tokio::fs::metadata(&full)
                .await
                .map_err(|e| io_error(path, e))?;
            Ok(FileStat {
                size: meta.len(),
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
            })
        })
    }
}
