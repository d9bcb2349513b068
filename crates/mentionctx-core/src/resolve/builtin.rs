//! Built-in resolvers for the well-known mention kinds.

use std::collections::HashSet;

use tracing::debug;

use super::{Contribution, ResolveError, ResolverSettings};
use crate::context::{FileEntry, GitSnapshot, GitStatus, SymbolEntry};
use crate::mention::{LineRange, Mention, SymbolLocation};
use crate::provider::{FileAccess, ProviderError, Providers, SymbolLookup};

pub(super) async fn resolve_mention(
    providers: &Providers,
    settings: &ResolverSettings,
    mention: Mention,
) -> Result<Contribution, ResolveError> {
    match mention {
        Mention::File { path, lines } => {
            let files = require(providers.files(), "file access")?;
            let entry = read_file(files, &path, lines).await?;
            Ok(Contribution::files(vec![entry]))
        }
        Mention::Folder {
            path,
            recursive,
            limit,
        } => {
            let files = require(providers.files(), "file access")?;
            let limit = limit.unwrap_or(settings.folder_limit);
            read_folder(files, &path, recursive, limit).await
        }
        Mention::Errors { file, severity } => {
            let diagnostics = require(providers.diagnostics(), "diagnostics")?;
            let mut entries = diagnostics.for_file(file.as_deref()).await?;
            if let Some(severity) = severity {
                entries.retain(|d| d.severity == severity);
            }
            Ok(Contribution::diagnostics(entries))
        }
        Mention::Diff(options) => {
            let vcs = require(providers.vcs(), "version control")?;
            let diff = vcs.diff(&options).await?;
            let changed_files = vcs.changed_files().await?;
            let branch = vcs.current_branch().await?;
            Ok(Contribution::git(GitSnapshot {
                diff,
                branch,
                changed_files,
            }))
        }
        Mention::Modified => {
            let vcs = require(providers.vcs(), "version control")?;
            let files = require(providers.files(), "file access")?;
            let changed = vcs.changed_files().await?;

            let mut entries = Vec::new();
            for change in changed.iter().filter(|c| c.status != GitStatus::Deleted) {
                match read_file(files, &change.path, None).await {
                    Ok(mut entry) => {
                        entry.git_status = Some(change.status);
                        entries.push(entry);
                    }
                    Err(e) => {
                        debug!(path = %change.path, error = %e, "Skipping unreadable modified file")
                    }
                }
            }
            Ok(Contribution::files(entries))
        }
        Mention::Recent | Mention::Open => {
            debug!("No editor state provider registered; mention contributes nothing");
            Ok(Contribution::default())
        }
        Mention::Symbol {
            name,
            kind,
            location,
        } => {
            let symbols = require(providers.symbols(), "symbol lookup")?;
            let mut found = match location {
                Some(location) => lookup_at(symbols, &location).await?,
                None => symbols.find(&name, Some(kind)).await?,
            };
            expand_dependencies(symbols, &mut found).await;
            Ok(Contribution::symbols(found))
        }
        Mention::Custom(kind) => Err(ResolveError::UnknownKind { kind }),
    }
}

fn require<'a, T: ?Sized>(slot: Option<&'a T>, capability: &str) -> Result<&'a T, ResolveError> {
    slot.ok_or_else(|| ResolveError::MissingCapability {
        capability: capability.to_string(),
    })
}

/// Read `path`, slice it to `lines` if given, and attach language and stat data.
async fn read_file(
    files: &dyn FileAccess,
    path: &str,
    lines: Option<LineRange>,
) -> Result<FileEntry, ProviderError> {
    let content = files.read(path).await?;
    let stat = match files.stat(path).await {
        Ok(stat) => Some(stat),
        Err(e) => {
            debug!(path, error = %e, "stat failed, falling back to content length");
            None
        }
    };

    let mut entry = FileEntry::new(path, content);
    entry.size = Some(stat.map_or(entry.content.len() as u64, |s| s.size));
    entry.last_modified = stat.and_then(|s| s.last_modified);

    if let Some((sliced, range)) = lines.and_then(|range| slice_lines(&entry.content, range)) {
        entry.content = sliced;
        entry.line_range = Some(range);
    }
    Ok(entry)
}

/// Cut `content` down to `range`, clamped to the file. `None` for an empty file.
pub(crate) fn slice_lines(content: &str, range: LineRange) -> Option<(String, LineRange)> {
    let lines: Vec<&str> = content.lines().collect();
    let range = range.clamp_to(lines.len())?;
    let slice = lines[(range.start - 1) as usize..range.end as usize].join("\n");
    Some((slice, range))
}

async fn read_folder(
    files: &dyn FileAccess,
    path: &str,
    recursive: bool,
    limit: usize,
) -> Result<Contribution, ResolveError> {
    let pattern = match (path.is_empty(), recursive) {
        (true, false) => "*".to_string(),
        (true, true) => "**/*".to_string(),
        (false, false) => format!("{path}/*"),
        (false, true) => format!("{path}/**/*"),
    };

    let matched = files.list(&pattern).await?;
    debug!(%pattern, matched = matched.len(), limit, "Listing folder");

    let mut entries = Vec::new();
    for file in matched.iter().take(limit) {
        match read_file(files, file, None).await {
            Ok(entry) => entries.push(entry),
            Err(e) => debug!(path = %file, error = %e, "Skipping unreadable folder entry"),
        }
    }
    Ok(Contribution::files(entries))
}

async fn lookup_at(
    symbols: &dyn SymbolLookup,
    location: &SymbolLocation,
) -> Result<Vec<SymbolEntry>, ProviderError> {
    let mut found: Vec<SymbolEntry> = symbols
        .definition_at(&location.file, location.line, location.column)
        .await?
        .into_iter()
        .collect();
    if location.with_references {
        found.extend(
            symbols
                .references_at(&location.file, location.line, location.column)
                .await?,
        );
    }
    Ok(found)
}

/// Append the direct dependencies of `found`, one level deep.
///
/// Symbols added here are not themselves expanded. A dependency already
/// present (same name and file) is not added twice.
async fn expand_dependencies(symbols: &dyn SymbolLookup, found: &mut Vec<SymbolEntry>) {
    let mut seen: HashSet<(String, String)> = found
        .iter()
        .map(|s| (s.name.clone(), s.file.clone()))
        .collect();

    let mut wanted: Vec<String> = Vec::new();
    for dep in found.iter().flat_map(|s| s.dependencies.iter().flatten()) {
        if !wanted.contains(dep) {
            wanted.push(dep.clone());
        }
    }

    for dep in wanted {
        match symbols.find(&dep, None).await {
            Ok(matches) => {
                for symbol in matches {
                    if seen.insert((symbol.name.clone(), symbol.file.clone())) {
                        found.push(symbol);
                    }
                }
            }
            Err(e) => debug!(dependency = %dep, error = %e, "Dependency lookup failed"),
        }
    }
}
