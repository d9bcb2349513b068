//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use mentionctx_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .max_tokens(500)
///     .preserve_symbols(true)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn folder_limit(mut self, limit: usize) -> Self {
        self.config.resolver.folder_limit = limit;
        self
    }

    pub fn chars_per_token(mut self, n: usize) -> Self {
        self.config.resolver.chars_per_token = n;
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.optimizer.max_tokens = max_tokens;
        self
    }

    pub fn truncate_content(mut self, yes: bool) -> Self {
        self.config.optimizer.truncate_content = yes;
        self
    }

    pub fn preserve_symbols(mut self, yes: bool) -> Self {
        self.config.optimizer.preserve_symbols = yes;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
