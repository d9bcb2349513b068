#![deny(unsafe_code)]

//! mentionctx CLI: resolve mention tokens against a local workspace and fit
//! the result to a token budget.

mod git;
mod local;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mentionctx_config::AppConfig;
use mentionctx_core::{
    CharRatioEstimator, MentionToken, OptimizationStrategy, Optimizer, Providers, ResolvedContext,
    Resolver, ResolverSettings, TokenEstimator,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::git::GitCli;
use crate::local::LocalFiles;

/// mentionctx: gather @-mentioned code context within a token budget.
#[derive(Parser)]
#[command(name = "mentionctx", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "mentionctx.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a JSON array of mention tokens and print the context as JSON.
    Resolve {
        /// File holding the tokens.
        tokens: PathBuf,

        /// Workspace root that mentioned paths are relative to.
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Optimize the result to this many tokens.
        #[arg(long)]
        max_tokens: Option<usize>,
    },

    /// Optimize a previously resolved context and print it as JSON.
    Optimize {
        /// File holding the resolved context.
        context: PathBuf,

        /// Token budget; defaults to `optimizer.max_tokens` from the config.
        #[arg(long)]
        max_tokens: Option<usize>,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    // Logs go to stderr; stdout carries the JSON output.
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve {
            tokens,
            root,
            max_tokens,
        } => cmd_resolve(&config, &tokens, root, max_tokens).await?,
        Commands::Optimize {
            context,
            max_tokens,
        } => cmd_optimize(&config, &context, max_tokens).await?,
        Commands::Config { show } => cmd_config(&config, &cli.config, show)?,
    }

    Ok(())
}

async fn cmd_resolve(
    config: &AppConfig,
    tokens_path: &Path,
    root: PathBuf,
    max_tokens: Option<usize>,
) -> Result<()> {
    let text = tokio::fs::read_to_string(tokens_path)
        .await
        .with_context(|| format!("reading {}", tokens_path.display()))?;
    let tokens: Vec<MentionToken> =
        serde_json::from_str(&text).context("tokens must be a JSON array of mention tokens")?;

    info!(tokens = tokens.len(), root = %root.display(), "Resolving mentions");
    let providers = local_providers(config, root);
    let resolver = Resolver::with_settings(
        providers.clone(),
        ResolverSettings::from_config(&config.resolver),
    );
    let mut context = resolver.resolve(&tokens).await;
    for warning in &context.warnings {
        warn!(mention = %warning.raw, reason = %warning.reason, "Mention skipped");
    }

    if let Some(max_tokens) = max_tokens {
        let optimizer = build_optimizer(config, Some(max_tokens), providers.shared_estimator())?;
        context = optimizer.optimize(&context);
    }

    print_context(&context)
}

async fn cmd_optimize(config: &AppConfig, path: &Path, max_tokens: Option<usize>) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let context: ResolvedContext =
        serde_json::from_str(&text).context("input is not a resolved context")?;

    let estimator = Arc::new(CharRatioEstimator::new(config.resolver.chars_per_token));
    let optimizer = build_optimizer(config, max_tokens, estimator)?;
    let optimized = optimizer.optimize(&context);
    info!(
        before = context.metadata.token_count,
        after = optimized.metadata.token_count,
        budget = optimizer.strategy().max_tokens,
        "Context optimized"
    );

    print_context(&optimized)
}

fn cmd_config(config: &AppConfig, config_path: &Path, show: bool) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

/// Filesystem and git providers rooted at `root`, counting tokens per config.
fn local_providers(config: &AppConfig, root: PathBuf) -> Providers {
    Providers::new()
        .with_files(Arc::new(LocalFiles::new(root.clone())))
        .with_vcs(Arc::new(GitCli::new(root)))
        .with_estimator(Arc::new(CharRatioEstimator::new(
            config.resolver.chars_per_token,
        )))
}

/// An optimizer from the `[optimizer]` section, with `max_tokens` overriding
/// the configured budget.
fn build_optimizer(
    config: &AppConfig,
    max_tokens: Option<usize>,
    estimator: Arc<dyn TokenEstimator>,
) -> Result<Optimizer> {
    let mut strategy = OptimizationStrategy::from_config(&config.optimizer);
    if let Some(max_tokens) = max_tokens {
        strategy.max_tokens = max_tokens;
    }
    Ok(Optimizer::new(strategy)?.with_estimator(estimator))
}

fn print_context(context: &ResolvedContext) -> Result<()> {
    let json = serde_json::to_string_pretty(context)?;
    println!("{json}");
    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        AppConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentionctx_test_utils::config::TestConfigBuilder;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::parse_from([
            "mentionctx",
            "-v",
            "resolve",
            "tokens.json",
            "--root",
            "/work",
            "--max-tokens",
            "500",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Resolve {
                tokens,
                root,
                max_tokens,
            } => {
                assert_eq!(tokens, PathBuf::from("tokens.json"));
                assert_eq!(root, PathBuf::from("/work"));
                assert_eq!(max_tokens, Some(500));
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_override_replaces_configured_budget() {
        let config = TestConfigBuilder::new()
            .max_tokens(900)
            .truncate_content(false)
            .build();
        let estimator = Arc::new(CharRatioEstimator::default());

        let optimizer = build_optimizer(&config, None, estimator.clone()).unwrap();
        assert_eq!(optimizer.strategy().max_tokens, 900);
        assert!(!optimizer.strategy().truncate_content);

        let optimizer = build_optimizer(&config, Some(50), estimator.clone()).unwrap();
        assert_eq!(optimizer.strategy().max_tokens, 50);

        assert!(build_optimizer(&config, Some(0), estimator).is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_config_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/mentionctx.toml"))
            .await
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test_log::test(tokio::test)]
    async fn test_resolve_against_local_workspace() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("src")).await.unwrap();
        tokio::fs::write(tmp.path().join("src/app.ts"), "console.log(\"Hello World\");")
            .await
            .unwrap();

        let config = TestConfigBuilder::new().build();
        let resolver = Resolver::new(local_providers(&config, tmp.path().to_path_buf()));
        let ctx = resolver
            .resolve(&[
                MentionToken::new("file", "src/app.ts"),
                MentionToken::new("folder", "src"),
                MentionToken::new("file", "../escape.ts"),
            ])
            .await;

        assert_eq!(ctx.files.len(), 1);
        assert_eq!(ctx.metadata.token_count, 7);
        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.warnings[0].raw, "@file:../escape.ts");
    }

    #[test_log::test(tokio::test)]
    async fn test_configured_chars_per_token_drives_counts() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("app.ts"), "console.log(\"Hello World\");")
            .await
            .unwrap();

        let config = TestConfigBuilder::new().chars_per_token(2).build();
        let resolver = Resolver::new(local_providers(&config, tmp.path().to_path_buf()));
        let ctx = resolver.resolve(&[MentionToken::new("file", "app.ts")]).await;

        // 27 chars at 2 per token
        assert_eq!(ctx.metadata.token_count, 14);
    }
}
