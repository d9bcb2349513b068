//! Optimization engine: shrinks a resolved context to fit a token budget.
//!
//! The optimizer works on a copy of its input and runs an ordered pipeline of
//! lossy stages, checking the budget before the first stage and after each
//! one and stopping as soon as the context fits:
//!
//! 1. **Strip metadata**: drop per-file size, mtime, and git status.
//! 2. **Reprioritize**: stable-sort files by language, recency, then size.
//! 3. **Shrink or drop**: truncate the largest file, removing it once it
//!    cannot get shorter, until the budget holds or no files remain. Without
//!    truncation the lowest-priority file is removed instead.
//! 4. **Symbol budget**: keep the highest-priority symbols that fit in a
//!    fixed share of the budget.
//!
//! Metadata is recomputed on the result. A budget that cannot be reached is
//! not an error; callers compare `metadata.token_count` against their limit.

pub mod truncate;

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::context::{
    CharRatioEstimator, FileEntry, ResolvedContext, SymbolEntry, TokenEstimator, token_total,
};

pub use truncate::{TRUNCATION_MARKER, truncate_lines};

/// Errors from constructing an optimizer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    #[error("invalid optimization strategy: {0}")]
    InvalidStrategy(String),
}

/// Fixed ratios that drive the lossy stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Heuristics {
    /// Share of a file's lines kept by one truncation.
    pub keep_ratio: f64,
    /// Share of the kept lines taken from the top of the file.
    pub head_ratio: f64,
    /// A file is removed rather than truncated below this many lines.
    pub min_truncated_lines: usize,
    /// Share of `max_tokens` allotted to symbols in the symbol stage.
    pub symbol_budget_ratio: f64,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            keep_ratio: 0.7,
            head_ratio: 0.6,
            min_truncated_lines: 10,
            symbol_budget_ratio: 0.2,
        }
    }
}

/// How aggressively, and in what ways, a context may be reduced.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationStrategy {
    pub max_tokens: usize,
    /// Prefer recently modified files when ranking.
    pub prioritize_recent_files: bool,
    /// Keep size / mtime / git status on files.
    pub include_file_metadata: bool,
    /// Truncate large files before removing any.
    pub truncate_content: bool,
    /// Never drop symbols.
    pub preserve_symbols: bool,
    pub tuning: Heuristics,
}

impl OptimizationStrategy {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            prioritize_recent_files: true,
            include_file_metadata: true,
            truncate_content: true,
            preserve_symbols: false,
            tuning: Heuristics::default(),
        }
    }

    pub fn from_config(config: &mentionctx_config::OptimizerConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            prioritize_recent_files: config.prioritize_recent_files,
            include_file_metadata: config.include_file_metadata,
            truncate_content: config.truncate_content,
            preserve_symbols: config.preserve_symbols,
            tuning: Heuristics {
                keep_ratio: config.keep_ratio,
                head_ratio: config.head_ratio,
                min_truncated_lines: config.min_truncated_lines,
                symbol_budget_ratio: config.symbol_budget_ratio,
            },
        }
    }

    pub fn prioritize_recent_files(mut self, yes: bool) -> Self {
        self.prioritize_recent_files = yes;
        self
    }

    pub fn include_file_metadata(mut self, yes: bool) -> Self {
        self.include_file_metadata = yes;
        self
    }

    pub fn truncate_content(mut self, yes: bool) -> Self {
        self.truncate_content = yes;
        self
    }

    pub fn preserve_symbols(mut self, yes: bool) -> Self {
        self.preserve_symbols = yes;
        self
    }

    pub fn with_tuning(mut self, tuning: Heuristics) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.max_tokens == 0 {
            return Err(OptimizeError::InvalidStrategy(
                "max_tokens must be positive".to_string(),
            ));
        }
        let ratios = [
            ("keep_ratio", self.tuning.keep_ratio),
            ("head_ratio", self.tuning.head_ratio),
            ("symbol_budget_ratio", self.tuning.symbol_budget_ratio),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value < 1.0) {
                return Err(OptimizeError::InvalidStrategy(format!(
                    "{name} must be in (0.0, 1.0), got {value}"
                )));
            }
        }
        if self.tuning.min_truncated_lines == 0 {
            return Err(OptimizeError::InvalidStrategy(
                "min_truncated_lines must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Applies an [`OptimizationStrategy`] to resolved contexts.
#[derive(Clone)]
pub struct Optimizer {
    strategy: OptimizationStrategy,
    estimator: Arc<dyn TokenEstimator>,
}

impl Optimizer {
    /// Create an optimizer, rejecting a malformed strategy up front.
    pub fn new(strategy: OptimizationStrategy) -> Result<Self, OptimizeError> {
        strategy.validate()?;
        Ok(Self {
            strategy,
            estimator: Arc::new(CharRatioEstimator::default()),
        })
    }

    /// Use the same estimator the resolver used.
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn strategy(&self) -> &OptimizationStrategy {
        &self.strategy
    }

    /// Return a reduced copy of `context`. The input is left untouched.
    pub fn optimize(&self, context: &ResolvedContext) -> ResolvedContext {
        let est = self.estimator.as_ref();
        let budget = self.strategy.max_tokens;
        let mut out = context.clone();
        let mut total = token_total(&out.files, &out.symbols, est);

        debug!(tokens = total, budget, "Optimizing context");
        if total <= budget {
            out.refresh_metadata(est);
            return out;
        }

        if !self.strategy.include_file_metadata {
            strip_metadata(&mut out.files);
            debug!(stage = "strip_metadata", tokens = total);
        }

        rank_files(&mut out.files, self.strategy.prioritize_recent_files);
        debug!(stage = "reprioritize", files = out.files.len());

        total = self.shrink_files(&mut out.files, total);
        debug!(stage = "shrink_files", tokens = total, files = out.files.len());

        if total > budget && !self.strategy.preserve_symbols {
            let before = out.symbols.len();
            out.symbols = self.budget_symbols(std::mem::take(&mut out.symbols));
            debug!(
                stage = "symbol_budget",
                kept = out.symbols.len(),
                dropped = before - out.symbols.len()
            );
        }

        out.refresh_metadata(est);
        if out.metadata.token_count > budget {
            debug!(
                tokens = out.metadata.token_count,
                budget, "Budget not reachable, returning best effort"
            );
        }
        out
    }

    /// Shrink files until the budget holds or no files remain. Returns the new
    /// running total.
    ///
    /// With truncation on, the largest file is truncated, or removed once it
    /// cannot get any shorter. With truncation off, the last-ranked file goes.
    fn shrink_files(&self, files: &mut Vec<FileEntry>, mut total: usize) -> usize {
        let est = self.estimator.as_ref();
        let budget = self.strategy.max_tokens;

        while total > budget && !files.is_empty() {
            let removed = if self.strategy.truncate_content {
                let Some(idx) = largest_file(files) else {
                    break;
                };
                let current = &files[idx].content;
                if let Some(shorter) = truncate_lines(current, &self.strategy.tuning)
                    && shorter.chars().count() < current.chars().count()
                {
                    let before = est.file_tokens(&files[idx]);
                    files[idx].content = shorter;
                    total = total - before + est.file_tokens(&files[idx]);
                    continue;
                }
                debug!(path = %files[idx].path, "Removing file that cannot be truncated");
                files.remove(idx)
            } else {
                match files.pop() {
                    Some(file) => {
                        debug!(path = %file.path, "Removing lowest-priority file");
                        file
                    }
                    None => break,
                }
            };
            total = total.saturating_sub(est.file_tokens(&removed));
        }
        total
    }

    /// Keep symbols in kind-priority order while they fit the symbol allocation.
    fn budget_symbols(&self, mut symbols: Vec<SymbolEntry>) -> Vec<SymbolEntry> {
        let est = self.estimator.as_ref();
        let allocation =
            (self.strategy.max_tokens as f64 * self.strategy.tuning.symbol_budget_ratio) as usize;

        symbols.sort_by_key(|s| s.kind);
        let mut used = 0;
        let mut kept = Vec::new();
        for symbol in symbols {
            let cost = est.symbol_tokens(&symbol);
            if used + cost > allocation {
                break;
            }
            used += cost;
            kept.push(symbol);
        }
        kept
    }
}

/// Validate `strategy` and optimize `context` with the default estimator.
pub fn optimize(
    context: &ResolvedContext,
    strategy: &OptimizationStrategy,
) -> Result<ResolvedContext, OptimizeError> {
    Ok(Optimizer::new(strategy.clone())?.optimize(context))
}

fn strip_metadata(files: &mut [FileEntry]) {
    for file in files {
        file.size = None;
        file.last_modified = None;
        file.git_status = None;
    }
}

/// Stable sort: language priority, then newest first (if enabled), then smallest.
fn rank_files(files: &mut [FileEntry], prioritize_recent: bool) {
    files.sort_by(|a, b| {
        b.language
            .priority()
            .cmp(&a.language.priority())
            .then_with(|| {
                if prioritize_recent {
                    b.last_modified.cmp(&a.last_modified)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| a.content.len().cmp(&b.content.len()))
    });
}

/// Index of the file with the most content; the last-ranked one on ties.
fn largest_file(files: &[FileEntry]) -> Option<usize> {
    files
        .iter()
        .enumerate()
        .max_by_key(|(_, f)| f.content.len())
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GitStatus, SymbolKind};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn ctx(files: Vec<FileEntry>, symbols: Vec<SymbolEntry>) -> ResolvedContext {
        ResolvedContext::from_parts(
            files,
            Vec::new(),
            symbols,
            None,
            None,
            Vec::new(),
            &CharRatioEstimator::default(),
        )
    }

    fn lines(n: usize, width: usize) -> String {
        (0..n).map(|i| format!("{i:0>width$}\n")).collect()
    }

    #[test]
    fn test_rejects_zero_budget() {
        let err = Optimizer::new(OptimizationStrategy::new(0)).err().unwrap();
        assert!(matches!(err, OptimizeError::InvalidStrategy(_)));
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let strategy = OptimizationStrategy::new(100).with_tuning(Heuristics {
            keep_ratio: 1.5,
            ..Heuristics::default()
        });
        assert!(optimize(&ResolvedContext::empty(), &strategy).is_err());
    }

    #[test]
    fn test_within_budget_is_untouched() {
        let mut file = FileEntry::new("a.ts", lines(20, 9));
        file.size = Some(200);
        let input = ctx(vec![file, FileEntry::new("b.md", "# readme")], Vec::new());
        let budget = input.metadata.token_count;

        let strategy = OptimizationStrategy::new(budget).include_file_metadata(false);
        let out = optimize(&input, &strategy).unwrap();
        assert_eq!(out.files, input.files);
        assert_eq!(out.symbols, input.symbols);
        assert_eq!(out.metadata.token_count, input.metadata.token_count);
    }

    #[test]
    fn test_strips_metadata_when_over_budget() {
        let mut file = FileEntry::new("a.ts", lines(40, 19));
        file.size = Some(800);
        file.git_status = Some(GitStatus::Modified);
        let input = ctx(vec![file], Vec::new());

        let strategy = OptimizationStrategy::new(150)
            .include_file_metadata(false)
            .truncate_content(true);
        let out = optimize(&input, &strategy).unwrap();
        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].size, None);
        assert_eq!(out.files[0].git_status, None);
        // input untouched
        assert_eq!(input.files[0].size, Some(800));
    }

    #[test]
    fn test_rank_by_language_then_recency_then_size() {
        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let mut ts_old = FileEntry::new("old.ts", "x");
        ts_old.last_modified = Some(old);
        let mut ts_new = FileEntry::new("new.ts", "xxxx");
        ts_new.last_modified = Some(new);
        let md = FileEntry::new("readme.md", "x");
        let py = FileEntry::new("tool.py", "x");

        let mut files = vec![md.clone(), ts_old.clone(), py.clone(), ts_new.clone()];
        rank_files(&mut files, true);
        let order: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(order, vec!["new.ts", "old.ts", "tool.py", "readme.md"]);

        let mut files = vec![md, ts_new, py, ts_old];
        rank_files(&mut files, false);
        let order: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(order, vec!["old.ts", "new.ts", "tool.py", "readme.md"]);
    }

    #[test]
    fn test_removes_lowest_priority_without_truncation() {
        let input = ctx(
            vec![
                FileEntry::new("notes.txt", lines(10, 39)),
                FileEntry::new("app.ts", lines(10, 39)),
                FileEntry::new("data.json", lines(10, 39)),
            ],
            Vec::new(),
        );
        // each file is 400 chars = 100 tokens
        let strategy = OptimizationStrategy::new(200).truncate_content(false);
        let out = optimize(&input, &strategy).unwrap();

        let paths: Vec<_> = out.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["app.ts", "data.json"]);
        assert_eq!(out.metadata.token_count, 200);
    }

    #[test]
    fn test_truncates_before_removing() {
        let input = ctx(vec![FileEntry::new("big.ts", lines(500, 39))], Vec::new());
        assert_eq!(input.metadata.token_count, 5000);

        let out = optimize(&input, &OptimizationStrategy::new(250)).unwrap();
        assert_eq!(out.files.len(), 1);
        assert_eq!(truncate::marker_count(&out.files[0].content), 1);
        assert!(out.metadata.token_count <= 250);
    }

    #[test]
    fn test_unshrinkable_file_is_removed() {
        let input = ctx(vec![FileEntry::new("min.js", "x".repeat(20_000))], Vec::new());
        let out = optimize(&input, &OptimizationStrategy::new(250)).unwrap();
        assert!(out.files.is_empty());
        assert_eq!(out.metadata.token_count, 0);
    }

    #[test]
    fn test_unshrinkable_file_removed_before_smaller_ones() {
        let mut notes = "n".repeat(399);
        notes.push('\n');
        let input = ctx(
            vec![
                FileEntry::new("bundle.min.js", "x".repeat(20_000)),
                FileEntry::new("notes.md", notes.clone()),
            ],
            Vec::new(),
        );

        let out = optimize(&input, &OptimizationStrategy::new(250)).unwrap();
        assert_eq!(out.files, vec![FileEntry::new("notes.md", notes)]);
        assert_eq!(out.metadata.token_count, 100);
    }

    #[test]
    fn test_symbol_budget_keeps_priority_kinds() {
        let mut symbols = Vec::new();
        for (i, kind) in [SymbolKind::Enum, SymbolKind::Variable, SymbolKind::Function]
            .into_iter()
            .enumerate()
        {
            let mut s = SymbolEntry::new(format!("s{i}"), kind, "lib.rs", i as u32 + 1);
            s.content = Some("y".repeat(38)); // 40 chars → 10 tokens + 10 overhead
            symbols.push(s);
        }
        let input = ctx(Vec::new(), symbols);
        assert_eq!(input.metadata.token_count, 60);

        // allocation = 80% of 50 = 40 tokens, room for two symbols
        let strategy = OptimizationStrategy::new(50).with_tuning(Heuristics {
            symbol_budget_ratio: 0.8,
            ..Heuristics::default()
        });
        let out = optimize(&input, &strategy).unwrap();
        let kinds: Vec<_> = out.symbols.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SymbolKind::Function, SymbolKind::Variable]);
        assert_eq!(out.metadata.token_count, 40);
    }

    #[test]
    fn test_preserve_symbols_returns_best_effort() {
        let mut s = SymbolEntry::new("big", SymbolKind::Class, "lib.rs", 1);
        s.content = Some("z".repeat(400));
        let input = ctx(vec![FileEntry::new("a.ts", lines(5, 9))], vec![s]);

        let out = optimize(&input, &OptimizationStrategy::new(20).preserve_symbols(true)).unwrap();
        assert!(out.files.is_empty());
        assert_eq!(out.symbols.len(), 1);
        assert!(out.metadata.token_count > 20);
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let input = ctx(
            vec![
                FileEntry::new("a.ts", lines(300, 29)),
                FileEntry::new("b.py", lines(120, 49)),
                FileEntry::new("c.md", lines(80, 19)),
            ],
            vec![SymbolEntry::new("main", SymbolKind::Function, "a.ts", 1)],
        );
        let strategy = OptimizationStrategy::new(900);
        let once = optimize(&input, &strategy).unwrap();
        let twice = optimize(&once, &strategy).unwrap();

        assert!(once.metadata.token_count <= input.metadata.token_count);
        assert_eq!(twice.files, once.files);
        assert_eq!(twice.symbols, once.symbols);
        assert_eq!(twice.metadata.token_count, once.metadata.token_count);
    }
}
