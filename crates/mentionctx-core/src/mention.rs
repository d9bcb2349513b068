//! Mention tokens and their typed interpretation.
//!
//! Tokens arrive from an upstream parser as stringly-typed records. Before a
//! built-in resolver runs, the token is parsed into a [`Mention`], a closed
//! enum with one variant per well-known kind. Kinds this crate does not know
//! become [`Mention::Custom`] so a registered provider, or nothing, can handle
//! them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{Severity, SymbolKind};
use crate::resolve::ResolveError;

/// Folder mentions read at most this many files unless configured otherwise.
pub const DEFAULT_FOLDER_LIMIT: usize = 10;

/// A parsed reference awaiting resolution, as produced by the mention parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionToken {
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Byte offsets of the mention in the source text.
    #[serde(default)]
    pub source_span: (usize, usize),
    #[serde(default)]
    pub raw: String,
}

impl MentionToken {
    /// Create a token with no params; `raw` is rendered as `@kind:value`.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        let kind = kind.into();
        let value = value.into();
        let raw = if value.is_empty() {
            format!("@{kind}")
        } else {
            format!("@{kind}:{value}")
        };
        Self {
            kind,
            value,
            params: BTreeMap::new(),
            source_span: (0, raw.len()),
            raw,
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// A boolean flag: present with no value, `true`, `yes`, or `1`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.param(key), Some("" | "true" | "yes" | "1"))
    }
}

/// Inclusive, 1-indexed line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    /// Create a range, swapping the bounds if given in reverse.
    pub fn new(start: u32, end: u32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Parse `"start-end"` or a single line `"n"`. Line numbers start at 1.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (a.trim().parse().ok()?, b.trim().parse().ok()?),
            None => {
                let n = s.parse().ok()?;
                (n, n)
            }
        };
        if start == 0 || end == 0 {
            return None;
        }
        Some(Self::new(start, end))
    }

    /// Clamp to a file with `total_lines` lines. `None` if the file is empty.
    pub fn clamp_to(self, total_lines: usize) -> Option<Self> {
        if total_lines == 0 {
            return None;
        }
        let last = u32::try_from(total_lines).unwrap_or(u32::MAX);
        let start = self.start.min(last);
        let end = self.end.clamp(start, last);
        Some(Self { start, end })
    }

    /// Whether `other` overlaps or directly follows/precedes this range.
    pub fn touches(&self, other: &LineRange) -> bool {
        other.start <= self.end.saturating_add(1) && self.start <= other.end.saturating_add(1)
    }

    pub fn union(&self, other: &LineRange) -> LineRange {
        LineRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Options for a version-control diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Diff the index instead of the working tree.
    pub staged: bool,
    /// Restrict the diff to one path.
    pub file: Option<String>,
}

/// A source position for symbol lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Also pull in the references to the symbol at this position.
    pub with_references: bool,
}

/// A mention token interpreted by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mention {
    File {
        path: String,
        lines: Option<LineRange>,
    },
    Folder {
        path: String,
        recursive: bool,
        /// Explicit `limit=`; the resolver's default applies when absent.
        limit: Option<usize>,
    },
    Errors {
        file: Option<String>,
        severity: Option<Severity>,
    },
    Diff(DiffOptions),
    Modified,
    Recent,
    Open,
    Symbol {
        name: String,
        kind: SymbolKind,
        location: Option<SymbolLocation>,
    },
    /// A kind with no built-in resolver.
    Custom(String),
}

impl Mention {
    /// Interpret a token. Malformed parameters are reported, not guessed at.
    pub fn parse(token: &MentionToken) -> Result<Self, ResolveError> {
        let mention = match token.kind.as_str() {
            "file" => Mention::File {
                path: token.value.clone(),
                lines: token
                    .param("lines")
                    .map(|v| {
                        LineRange::parse(v).ok_or_else(|| invalid(token, "lines", v))
                    })
                    .transpose()?,
            },
            "folder" | "directory" => Mention::Folder {
                path: token.value.trim_end_matches('/').to_string(),
                recursive: token.flag("recursive"),
                limit: token
                    .param("limit")
                    .map(|v| {
                        v.trim()
                            .parse::<usize>()
                            .ok()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| invalid(token, "limit", v))
                    })
                    .transpose()?,
            },
            "error" | "errors" => Mention::Errors {
                file: token
                    .param("file")
                    .map(str::to_string)
                    .or_else(|| non_empty(&token.value)),
                severity: token
                    .param("severity")
                    .map(|v| Severity::parse(v).ok_or_else(|| invalid(token, "severity", v)))
                    .transpose()?,
            },
            "diff" => Mention::Diff(DiffOptions {
                staged: token.flag("staged") || token.value == "staged",
                file: token.param("file").map(str::to_string),
            }),
            "modified" => Mention::Modified,
            "recent" => Mention::Recent,
            "open" => Mention::Open,
            other => match SymbolKind::from_mention_kind(other) {
                Some(kind) => Mention::Symbol {
                    name: token.value.clone(),
                    kind,
                    location: symbol_location(token)?,
                },
                None => Mention::Custom(other.to_string()),
            },
        };
        Ok(mention)
    }
}

fn symbol_location(token: &MentionToken) -> Result<Option<SymbolLocation>, ResolveError> {
    let (Some(file), Some(line)) = (token.param("file"), token.param("line")) else {
        return Ok(None);
    };
    let line = parse_position(token, "line", line)?;
    let column = match token.param("col") {
        Some(col) => parse_position(token, "col", col)?,
        None => 1,
    };
    Ok(Some(SymbolLocation {
        file: file.to_string(),
        line,
        column,
        with_references: token.flag("references"),
    }))
}

fn parse_position(token: &MentionToken, key: &str, value: &str) -> Result<u32, ResolveError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| invalid(token, key, value))
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn invalid(token: &MentionToken, param: &str, value: &str) -> ResolveError {
    ResolveError::InvalidParam {
        kind: token.kind.clone(),
        param: param.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_range_parse() {
        assert_eq!(LineRange::parse("1-3"), Some(LineRange::new(1, 3)));
        assert_eq!(LineRange::parse(" 7 "), Some(LineRange::new(7, 7)));
        assert_eq!(LineRange::parse("9-4"), Some(LineRange::new(4, 9)));
        assert_eq!(LineRange::parse("0-4"), None);
        assert_eq!(LineRange::parse("a-b"), None);
        assert_eq!(LineRange::parse(""), None);
    }

    #[test]
    fn test_line_range_clamp() {
        let r = LineRange::new(5, 100);
        assert_eq!(r.clamp_to(20), Some(LineRange::new(5, 20)));
        assert_eq!(LineRange::new(30, 40).clamp_to(20), Some(LineRange::new(20, 20)));
        assert_eq!(r.clamp_to(0), None);
    }

    #[test]
    fn test_line_range_touches() {
        let a = LineRange::new(1, 3);
        assert!(a.touches(&LineRange::new(2, 4)));
        assert!(a.touches(&LineRange::new(4, 6)));
        assert!(!a.touches(&LineRange::new(5, 6)));
        assert!(LineRange::new(5, 6).touches(&LineRange::new(1, 4)));
        assert_eq!(a.union(&LineRange::new(2, 4)), LineRange::new(1, 4));
    }

    #[test]
    fn test_parse_file_with_lines() {
        let token = MentionToken::new("file", "src/app.ts").with_param("lines", "10-20");
        assert_eq!(
            Mention::parse(&token).unwrap(),
            Mention::File {
                path: "src/app.ts".to_string(),
                lines: Some(LineRange::new(10, 20)),
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        let token = MentionToken::new("file", "src/app.ts").with_param("lines", "ten");
        let err = Mention::parse(&token).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidParam { ref param, .. } if param == "lines"));
    }

    #[test]
    fn test_parse_folder_defaults() {
        let token = MentionToken::new("directory", "src/");
        assert_eq!(
            Mention::parse(&token).unwrap(),
            Mention::Folder {
                path: "src".to_string(),
                recursive: false,
                limit: None,
            }
        );

        let token = MentionToken::new("folder", "src")
            .with_param("recursive", "")
            .with_param("limit", "3");
        assert!(matches!(
            Mention::parse(&token).unwrap(),
            Mention::Folder { recursive: true, limit: Some(3), .. }
        ));

        let token = MentionToken::new("folder", "src").with_param("limit", "0");
        assert!(Mention::parse(&token).is_err());
    }

    #[test]
    fn test_parse_errors_scope() {
        let all = MentionToken::new("error", "");
        assert_eq!(
            Mention::parse(&all).unwrap(),
            Mention::Errors {
                file: None,
                severity: None
            }
        );

        let scoped = MentionToken::new("errors", "src/lib.rs").with_param("severity", "warning");
        assert_eq!(
            Mention::parse(&scoped).unwrap(),
            Mention::Errors {
                file: Some("src/lib.rs".to_string()),
                severity: Some(Severity::Warning),
            }
        );
    }

    #[test]
    fn test_parse_diff_staged() {
        let token = MentionToken::new("diff", "").with_param("staged", "true");
        assert_eq!(
            Mention::parse(&token).unwrap(),
            Mention::Diff(DiffOptions {
                staged: true,
                file: None
            })
        );
    }

    #[test]
    fn test_parse_symbol_kinds() {
        for kind in ["function", "class", "method", "type", "interface", "variable"] {
            let token = MentionToken::new(kind, "Thing");
            assert!(
                matches!(Mention::parse(&token).unwrap(), Mention::Symbol { .. }),
                "{kind} should parse as a symbol mention"
            );
        }
    }

    #[test]
    fn test_parse_symbol_location() {
        let token = MentionToken::new("function", "run")
            .with_param("file", "src/main.rs")
            .with_param("line", "12")
            .with_param("references", "true");
        let Mention::Symbol { location, .. } = Mention::parse(&token).unwrap() else {
            panic!("expected symbol mention");
        };
        assert_eq!(
            location,
            Some(SymbolLocation {
                file: "src/main.rs".to_string(),
                line: 12,
                column: 1,
                with_references: true,
            })
        );
    }

    #[test]
    fn test_unknown_kind_is_custom() {
        let token = MentionToken::new("bogus", "whatever");
        assert_eq!(
            Mention::parse(&token).unwrap(),
            Mention::Custom("bogus".to_string())
        );
    }

    #[test]
    fn test_token_deserializes_with_defaults() {
        let token: MentionToken =
            serde_json::from_str(r#"{"kind":"file","value":"a.ts"}"#).unwrap();
        assert_eq!(token.kind, "file");
        assert!(token.params.is_empty());
        assert_eq!(token.source_span, (0, 0));
    }
}
