//! Version control through the `git` command line.

use std::collections::HashMap;
use std::path::PathBuf;

use mentionctx_core::BoxFuture;
use mentionctx_core::context::{ChangedFile, GitStatus};
use mentionctx_core::mention::DiffOptions;
use mentionctx_core::provider::{ProviderError, VersionControl};
use tokio::process::Command;
use tracing::debug;

/// Runs `git -C <root> ...` with `tokio::process`.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ProviderError> {
        debug!(?args, "Running git");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("cannot run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Other(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitCli {
    fn diff<'a>(
        &'a self,
        options: &'a DiffOptions,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let mut args = vec!["diff"];
            if options.staged {
                args.push("--cached");
            }
            if let Some(file) = &options.file {
                args.push("--");
                args.push(file);
            }
            self.run(&args).await
        })
    }

    fn changed_files(&self) -> BoxFuture<'_, Result<Vec<ChangedFile>, ProviderError>> {
        Box::pin(async move {
            let status = self.run(&["status", "--porcelain"]).await?;
            // An unborn branch has no HEAD to diff against.
            let numstat = match self.run(&["diff", "--numstat", "HEAD"]).await {
                Ok(out) => parse_numstat(&out),
                Err(e) => {
                    debug!(error = %e, "No line counts available");
                    HashMap::new()
                }
            };

            Ok(parse_porcelain(&status)
                .into_iter()
                .map(|(path, status)| {
                    let (additions, deletions) = numstat.get(&path).copied().unwrap_or((0, 0));
                    ChangedFile {
                        path,
                        status,
                        additions,
                        deletions,
                    }
                })
                .collect())
        })
    }

    fn current_branch(&self) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
            Ok(out.trim().to_string())
        })
    }
}

/// Parse `git status --porcelain` (v1) into paths and statuses.
fn parse_porcelain(output: &str) -> Vec<(String, GitStatus)> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let (code, rest) = line.split_at(2);
            let path = rest.trim_start();
            // renames and copies report `old -> new`
            let path = path.rsplit_once(" -> ").map_or(path, |(_, new)| new);
            (path.trim_matches('"').to_string(), status_from_code(code))
        })
        .collect()
}

fn status_from_code(code: &str) -> GitStatus {
    if code == "??" {
        return GitStatus::Untracked;
    }
    let mut chars = code.chars();
    let index = chars.next().unwrap_or(' ');
    let worktree = chars.next().unwrap_or(' ');
    let c = if index == ' ' { worktree } else { index };
    match c {
        'A' => GitStatus::Added,
        'D' => GitStatus::Deleted,
        'R' => GitStatus::Renamed,
        'C' => GitStatus::Copied,
        _ => GitStatus::Modified,
    }
}

/// Parse `git diff --numstat` into per-path `(additions, deletions)`.
/// Binary files report `-` and count as zero.
fn parse_numstat(output: &str) -> HashMap<String, (u32, u32)> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let added = parts.next()?.parse().unwrap_or(0);
            let deleted = parts.next()?.parse().unwrap_or(0);
            let path = parts.next()?;
            let path = path.rsplit_once(" => ").map_or(path, |(_, new)| new);
            Some((path.to_string(), (added, deleted)))
        })
        .collect()
}
