//! Language detection by file extension, and the optimizer's language ranking.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source language of a file, detected from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Java,
    C,
    Cpp,
    Go,
    Rust,
    Json,
    Yaml,
    Markdown,
    Toml,
    Html,
    Css,
    Shell,
    Text,
}

impl Language {
    /// Detect the language of `path` from its extension. Unknown → [`Language::Text`].
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "py" | "pyi" => Language::Python,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "json" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "md" | "markdown" => Language::Markdown,
            "toml" => Language::Toml,
            "html" | "htm" => Language::Html,
            "css" | "scss" => Language::Css,
            "sh" | "bash" | "zsh" => Language::Shell,
            _ => Language::Text,
        }
    }

    /// Retention priority used when files compete for budget (higher = kept longer).
    pub fn priority(self) -> u8 {
        match self {
            Language::TypeScript => 10,
            Language::JavaScript => 9,
            Language::Python => 8,
            Language::Java => 7,
            Language::C | Language::Cpp | Language::Go | Language::Rust => 6,
            Language::Json => 4,
            Language::Yaml => 3,
            Language::Markdown => 2,
            _ => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Markdown => "markdown",
            Language::Toml => "toml",
            Language::Html => "html",
            Language::Css => "css",
            Language::Shell => "shell",
            Language::Text => "text",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
