//! Builder for [`MentionToken`] values.

use std::collections::BTreeMap;

use mentionctx_core::MentionToken;

/// Fluent builder for mention tokens as an editor would emit them.
///
/// ```ignore
/// let token = TokenBuilder::new("file", "src/app.ts").param("lines", "1-20").build();
/// assert_eq!(token.raw, "@file:src/app.ts");
/// ```
pub struct TokenBuilder {
    kind: String,
    value: String,
    params: BTreeMap<String, String>,
    raw: Option<String>,
}

impl TokenBuilder {
    pub fn new(kind: &str, value: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.to_string(),
            params: BTreeMap::new(),
            raw: None,
        }
    }

    pub fn file(path: &str) -> Self {
        Self::new("file", path)
    }

    pub fn folder(path: &str) -> Self {
        Self::new("folder", path)
    }

    pub fn function(name: &str) -> Self {
        Self::new("function", name)
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Override the source text, e.g. for mentions typed without a kind.
    pub fn raw(mut self, raw: &str) -> Self {
        self.raw = Some(raw.to_string());
        self
    }

    pub fn build(self) -> MentionToken {
        let mut token = MentionToken::new(self.kind, self.value);
        token.params = self.params;
        if let Some(raw) = self.raw {
            token.raw = raw;
        }
        token
    }
}
