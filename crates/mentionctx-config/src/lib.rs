#![deny(unsafe_code)]

//! Configuration loading and validation for mentionctx.
//!
//! Loads TOML configuration files and validates them. [`AppConfig`] is the
//! central configuration structure; every field has a default, so an empty
//! file (or no file at all) yields a usable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Mention resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Token-budget optimization settings.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for the built-in mention resolvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Files read by a folder mention that carries no `limit` parameter.
    #[serde(default = "default_folder_limit")]
    pub folder_limit: usize,

    /// Characters counted as one token by the default estimator.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            folder_limit: default_folder_limit(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

fn default_folder_limit() -> usize {
    10
}

fn default_chars_per_token() -> usize {
    4
}

/// Token budget and the knobs of the optimization pipeline.
///
/// ## TOML Example
///
/// ```toml
/// [optimizer]
/// max_tokens = 4000
/// preserve_symbols = true
/// keep_ratio = 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Upper bound on the estimated token count of an optimized context.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_true")]
    pub prioritize_recent_files: bool,

    #[serde(default = "default_true")]
    pub include_file_metadata: bool,

    #[serde(default = "default_true")]
    pub truncate_content: bool,

    #[serde(default)]
    pub preserve_symbols: bool,

    /// Share of a file's lines kept per truncation step.
    #[serde(default = "default_keep_ratio")]
    pub keep_ratio: f64,

    /// Share of the kept lines taken from the start of the file.
    #[serde(default = "default_head_ratio")]
    pub head_ratio: f64,

    /// Files that would shrink below this many lines are removed instead.
    #[serde(default = "default_min_truncated_lines")]
    pub min_truncated_lines: usize,

    /// Share of `max_tokens` available to symbols.
    #[serde(default = "default_symbol_budget_ratio")]
    pub symbol_budget_ratio: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            prioritize_recent_files: true,
            include_file_metadata: true,
            truncate_content: true,
            preserve_symbols: false,
            keep_ratio: default_keep_ratio(),
            head_ratio: default_head_ratio(),
            min_truncated_lines: default_min_truncated_lines(),
            symbol_budget_ratio: default_symbol_budget_ratio(),
        }
    }
}

fn default_max_tokens() -> usize {
    8000
}

fn default_true() -> bool {
    true
}

fn default_keep_ratio() -> f64 {
    0.7
}

fn default_head_ratio() -> f64 {
    0.6
}

fn default_min_truncated_lines() -> usize {
    10
}

fn default_symbol_budget_ratio() -> f64 {
    0.2
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        if self.resolver.folder_limit == 0 {
            return Err(ConfigError::Validation(
                "resolver.folder_limit must be at least 1".to_string(),
            ));
        }
        if self.resolver.chars_per_token == 0 {
            return Err(ConfigError::Validation(
                "resolver.chars_per_token must be at least 1".to_string(),
            ));
        }

        let opt = &self.optimizer;
        if opt.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "optimizer.max_tokens must be non-zero".to_string(),
            ));
        }
        for (name, value) in [
            ("keep_ratio", opt.keep_ratio),
            ("head_ratio", opt.head_ratio),
            ("symbol_budget_ratio", opt.symbol_budget_ratio),
        ] {
            if value <= 0.0 || value >= 1.0 || value.is_nan() {
                return Err(ConfigError::Validation(format!(
                    "optimizer.{name} must be in (0.0, 1.0), got {value}"
                )));
            }
        }
        if opt.min_truncated_lines == 0 {
            return Err(ConfigError::Validation(
                "optimizer.min_truncated_lines must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.resolver.folder_limit, 10);
        assert_eq!(config.resolver.chars_per_token, 4);
        assert_eq!(config.optimizer.max_tokens, 8000);
        assert!(config.optimizer.prioritize_recent_files);
        assert!(config.optimizer.include_file_metadata);
        assert!(config.optimizer.truncate_content);
        assert!(!config.optimizer.preserve_symbols);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [logging]
            level = "debug"

            [resolver]
            folder_limit = 25
            chars_per_token = 3

            [optimizer]
            max_tokens = 4000
            prioritize_recent_files = false
            include_file_metadata = false
            truncate_content = false
            preserve_symbols = true
            keep_ratio = 0.5
            head_ratio = 0.5
            min_truncated_lines = 4
            symbol_budget_ratio = 0.3
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.resolver.folder_limit, 25);
        assert_eq!(config.resolver.chars_per_token, 3);
        assert_eq!(config.optimizer.max_tokens, 4000);
        assert!(!config.optimizer.prioritize_recent_files);
        assert!(!config.optimizer.include_file_metadata);
        assert!(!config.optimizer.truncate_content);
        assert!(config.optimizer.preserve_symbols);
        assert_eq!(config.optimizer.keep_ratio, 0.5);
        assert_eq!(config.optimizer.min_truncated_lines, 4);
        assert_eq!(config.optimizer.symbol_budget_ratio, 0.3);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml = r#"
            [optimizer]
            max_tokens = 500
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.optimizer.max_tokens, 500);
        assert_eq!(config.optimizer.keep_ratio, 0.7);
        assert_eq!(config.optimizer.head_ratio, 0.6);
        assert_eq!(config.resolver, ResolverConfig::default());
    }

    #[test]
    fn test_validation_rejects_zero_budget() {
        let result = AppConfig::parse("[optimizer]\nmax_tokens = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_ratio_out_of_range() {
        for toml in [
            "[optimizer]\nkeep_ratio = 1.0\n",
            "[optimizer]\nhead_ratio = 0.0\n",
            "[optimizer]\nsymbol_budget_ratio = 1.5\n",
        ] {
            assert!(AppConfig::parse(toml).is_err(), "accepted {toml:?}");
        }
    }

    #[test]
    fn test_validation_rejects_zero_resolver_limits() {
        assert!(AppConfig::parse("[resolver]\nfolder_limit = 0\n").is_err());
        assert!(AppConfig::parse("[resolver]\nchars_per_token = 0\n").is_err());
        assert!(AppConfig::parse("[optimizer]\nmin_truncated_lines = 0\n").is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_log_level() {
        let result = AppConfig::parse("[logging]\nlevel = \"chatty\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = AppConfig::default();
        config.optimizer.max_tokens = 1234;
        let text = toml::to_string(&config).unwrap();
        assert_eq!(AppConfig::parse(&text).unwrap(), config);
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mentionctx.toml");
        tokio::fs::write(&path, b"[resolver]\nfolder_limit = 3\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.resolver.folder_limit, 3);
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/file.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
