//! Entries that make up a resolved context: files, symbols, diagnostics, git.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::language::Language;
use crate::mention::LineRange;

/// A file (or a line range of a file) pulled into the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Path as reported by the file provider. Unique within a context.
    pub path: String,
    /// File content, or the requested slice of it.
    pub content: String,
    /// Inclusive 1-indexed range when only part of the file was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
    /// Language detected from the file extension.
    pub language: Language,
    /// Size of the whole file on disk, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_status: Option<GitStatus>,
}

impl FileEntry {
    /// Create a whole-file entry with language detected from `path`.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self {
            path,
            content: content.into(),
            line_range: None,
            language,
            size: None,
            last_modified: None,
            git_status: None,
        }
    }

    /// Whether this entry carries the whole file rather than a slice.
    pub fn is_whole_file(&self) -> bool {
        self.line_range.is_none()
    }

    /// Number of lines in the carried content.
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Working-tree status reported by version control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Untracked,
}

impl fmt::Display for GitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitStatus::Added => write!(f, "added"),
            GitStatus::Modified => write!(f, "modified"),
            GitStatus::Deleted => write!(f, "deleted"),
            GitStatus::Renamed => write!(f, "renamed"),
            GitStatus::Copied => write!(f, "copied"),
            GitStatus::Untracked => write!(f, "untracked"),
        }
    }
}

/// Kind of code symbol.
///
/// Variant order doubles as the optimizer's retention priority: earlier
/// kinds are kept first when the symbol budget is tight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Interface,
    Type,
    Variable,
    Constant,
    Enum,
}

impl SymbolKind {
    /// Parse a mention kind string (`"function"`, `"class"`, ...).
    pub fn from_mention_kind(kind: &str) -> Option<Self> {
        match kind {
            "function" => Some(SymbolKind::Function),
            "class" => Some(SymbolKind::Class),
            "method" => Some(SymbolKind::Method),
            "interface" => Some(SymbolKind::Interface),
            "type" => Some(SymbolKind::Type),
            "variable" => Some(SymbolKind::Variable),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Class => write!(f, "class"),
            SymbolKind::Method => write!(f, "method"),
            SymbolKind::Interface => write!(f, "interface"),
            SymbolKind::Type => write!(f, "type"),
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Constant => write!(f, "constant"),
            SymbolKind::Enum => write!(f, "enum"),
        }
    }
}

/// A code symbol returned by a symbol provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Names of symbols this one refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

impl SymbolEntry {
    /// Create a symbol with only its identifying fields set.
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file: file.into(),
            line,
            column: 1,
            content: None,
            signature: None,
            documentation: None,
            dependencies: None,
            container_name: None,
        }
    }

    /// Dedup key: `(name, file, line)`.
    pub fn key(&self) -> (&str, &str, u32) {
        (&self.name, &self.file, self.line)
    }

    /// Text that counts toward the symbol's token cost.
    pub fn cost_text(&self) -> String {
        let mut text = self.name.clone();
        for part in [&self.content, &self.signature, &self.documentation]
            .into_iter()
            .flatten()
        {
            text.push_str(part);
        }
        text
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "info" | "information" => Some(Severity::Info),
            "hint" => Some(Severity::Hint),
            _ => None,
        }
    }
}

/// A compiler / linter diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEntry {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A file changed in the working tree, as reported by version control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    pub path: String,
    pub status: GitStatus,
    pub additions: u32,
    pub deletions: u32,
}

/// Diff, branch, and changed files captured together by a `diff` mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSnapshot {
    pub diff: String,
    pub branch: String,
    pub changed_files: Vec<ChangedFile>,
}
