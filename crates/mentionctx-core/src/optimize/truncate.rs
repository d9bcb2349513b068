//! Line-based truncation that keeps the head and tail of a file.

use super::Heuristics;

/// Line inserted where content was elided.
pub const TRUNCATION_MARKER: &str = "... [content truncated] ...";

/// Shrink `content` to `keep_ratio` of its lines: the first `head_ratio` of
/// the kept lines, one [`TRUNCATION_MARKER`], then the rest from the end.
///
/// Returns `None` when the result would fall below `min_truncated_lines`
/// lines or would not drop any line. A marker left by an earlier truncation
/// is discarded first, so the output always holds exactly one.
pub fn truncate_lines(content: &str, tuning: &Heuristics) -> Option<String> {
    let lines: Vec<&str> = content
        .lines()
        .filter(|line| *line != TRUNCATION_MARKER)
        .collect();

    let keep = (lines.len() as f64 * tuning.keep_ratio).floor() as usize;
    if keep < tuning.min_truncated_lines || keep >= lines.len() {
        return None;
    }
    let head = ((keep as f64 * tuning.head_ratio).round() as usize).min(keep);
    let tail = keep - head;

    let mut kept: Vec<&str> = Vec::with_capacity(keep + 1);
    kept.extend(&lines[..head]);
    kept.push(TRUNCATION_MARKER);
    kept.extend(&lines[lines.len() - tail..]);

    let mut out = kept.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    Some(out)
}

/// Number of truncation markers in `content`.
pub fn marker_count(content: &str) -> usize {
    content
        .lines()
        .filter(|line| *line == TRUNCATION_MARKER)
        .count()
}
