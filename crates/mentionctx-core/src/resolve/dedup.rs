//! Deduplication of resolved files and symbols.
//!
//! Files collapse to one entry per path: a whole-file entry beats any ranged
//! entry, and ranged entries are stitched together line by line. Symbols
//! collapse per `(name, file, line)` with the last entry winning.

use std::collections::{BTreeMap, HashMap};

use crate::context::{FileEntry, SymbolEntry};
use crate::mention::LineRange;

/// Collapse files to one entry per path, keeping first-appearance order.
pub fn dedup_files(files: Vec<FileEntry>) -> Vec<FileEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<FileEntry>> = HashMap::new();

    for file in files {
        let group = groups.entry(file.path.clone()).or_insert_with(|| {
            order.push(file.path.clone());
            Vec::new()
        });
        group.push(file);
    }

    order
        .into_iter()
        .filter_map(|path| groups.remove(&path))
        .filter_map(merge_group)
        .collect()
}

/// Merge every entry for one path into a single entry.
fn merge_group(mut entries: Vec<FileEntry>) -> Option<FileEntry> {
    if let Some(idx) = entries.iter().rposition(FileEntry::is_whole_file) {
        return Some(entries.swap_remove(idx));
    }
    if entries.len() <= 1 {
        return entries.pop();
    }

    let mut lines: BTreeMap<u32, String> = BTreeMap::new();
    let mut ranges: Vec<LineRange> = Vec::new();
    for entry in &entries {
        let Some(range) = carried_range(entry) else {
            continue;
        };
        for (line, text) in (range.start..=range.end).zip(entry.content.split('\n')) {
            lines.insert(line, text.to_string());
        }
        ranges.push(range);
    }

    let segments = merge_ranges(ranges);
    let (first, last) = (segments.first()?.start, segments.last()?.end);

    let mut content: Vec<String> = Vec::new();
    let mut previous_end: Option<u32> = None;
    for segment in &segments {
        if let Some(end) = previous_end {
            content.push(elision_line(end + 1, segment.start - 1));
        }
        for line in segment.start..=segment.end {
            content.push(lines.get(&line).cloned().unwrap_or_default());
        }
        previous_end = Some(segment.end);
    }

    let mut merged = entries.pop()?;
    merged.content = content.join("\n");
    merged.line_range = Some(LineRange::new(first, last));
    Some(merged)
}

/// The part of an entry's range that its content actually covers.
fn carried_range(entry: &FileEntry) -> Option<LineRange> {
    let range = entry.line_range?;
    let carried = u32::try_from(entry.content.split('\n').count()).unwrap_or(u32::MAX);
    let last = range.start.saturating_add(carried - 1);
    Some(LineRange::new(range.start, last.min(range.end)))
}

/// Sort ranges and union those that overlap or are adjacent.
pub fn merge_ranges(mut ranges: Vec<LineRange>) -> Vec<LineRange> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<LineRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.touches(&range) => *last = last.union(&range),
            _ => merged.push(range),
        }
    }
    merged
}

/// Placeholder line for lines between two requested ranges.
pub fn elision_line(start: u32, end: u32) -> String {
    if start == end {
        format!("... [line {start} not included] ...")
    } else {
        format!("... [lines {start}-{end} not included] ...")
    }
}

/// Collapse symbols by `(name, file, line)`; later entries replace earlier ones
/// in the earlier entry's position.
pub fn dedup_symbols(symbols: Vec<SymbolEntry>) -> Vec<SymbolEntry> {
    let mut index: HashMap<(String, String, u32), usize> = HashMap::new();
    let mut out: Vec<SymbolEntry> = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let key = (symbol.name.clone(), symbol.file.clone(), symbol.line);
        match index.get(&key) {
            Some(&i) => out[i] = symbol,
            None => {
                index.insert(key, out.len());
                out.push(symbol);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SymbolKind;
    use pretty_assertions::assert_eq;

    fn ranged(path: &str, start: u32, end: u32) -> FileEntry {
        let content: Vec<String> = (start..=end).map(|n| format!("line {n}")).collect();
        let mut entry = FileEntry::new(path, content.join("\n"));
        entry.line_range = Some(LineRange::new(start, end));
        entry
    }

    #[test]
    fn test_identical_whole_files_collapse() {
        let files = vec![FileEntry::new("a.ts", "x"), FileEntry::new("a.ts", "x")];
        assert_eq!(dedup_files(files), vec![FileEntry::new("a.ts", "x")]);
    }

    #[test]
    fn test_overlapping_ranges_merge() {
        let merged = dedup_files(vec![ranged("a.ts", 1, 3), ranged("a.ts", 2, 4)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].line_range, Some(LineRange::new(1, 4)));
        assert_eq!(merged[0].content, "line 1\nline 2\nline 3\nline 4");
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        let merged = dedup_files(vec![ranged("a.ts", 5, 6), ranged("a.ts", 1, 4)]);
        assert_eq!(merged[0].line_range, Some(LineRange::new(1, 6)));
        assert_eq!(merged[0].content.lines().count(), 6);
    }

    #[test]
    fn test_disjoint_ranges_keep_one_entry_with_elision() {
        let merged = dedup_files(vec![ranged("a.ts", 1, 2), ranged("a.ts", 6, 7)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].line_range, Some(LineRange::new(1, 7)));
        assert_eq!(
            merged[0].content,
            "line 1\nline 2\n... [lines 3-5 not included] ...\nline 6\nline 7"
        );
    }

    #[test]
    fn test_range_clamped_to_carried_lines() {
        let mut short = FileEntry::new("a.ts", "a\nb");
        short.line_range = Some(LineRange::new(1, 1_000_000));
        let merged = dedup_files(vec![short, ranged("a.ts", 5, 6)]);
        assert_eq!(merged[0].line_range, Some(LineRange::new(1, 6)));
        assert_eq!(
            merged[0].content,
            "a\nb\n... [lines 3-4 not included] ...\nline 5\nline 6"
        );
    }

    #[test]
    fn test_range_at_end_of_line_space_does_not_overflow() {
        let mut tail = FileEntry::new("a.ts", "x\ny\nz");
        tail.line_range = Some(LineRange::new(u32::MAX - 1, u32::MAX));
        let merged = dedup_files(vec![ranged("a.ts", 1, 2), tail]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].line_range, Some(LineRange::new(1, u32::MAX)));
        assert_eq!(
            merged[0].content,
            "line 1\nline 2\n... [lines 3-4294967293 not included] ...\nx\ny"
        );
    }

    #[test]
    fn test_blank_last_line_of_slice_is_kept() {
        let mut slice = FileEntry::new("a.ts", "b\n");
        slice.line_range = Some(LineRange::new(2, 3));
        let merged = dedup_files(vec![slice, ranged("a.ts", 4, 4)]);
        assert_eq!(merged[0].line_range, Some(LineRange::new(2, 4)));
        assert_eq!(merged[0].content, "b\n\nline 4");
    }

    #[test]
    fn test_whole_file_wins_regardless_of_order() {
        let whole = FileEntry::new("a.ts", "full");
        for files in [
            vec![ranged("a.ts", 1, 2), whole.clone()],
            vec![whole.clone(), ranged("a.ts", 1, 2)],
        ] {
            let merged = dedup_files(files);
            assert_eq!(merged, vec![whole.clone()]);
        }
    }

    #[test]
    fn test_order_of_first_appearance_kept() {
        let files = vec![
            FileEntry::new("b.ts", "b"),
            FileEntry::new("a.ts", "a"),
            FileEntry::new("b.ts", "b"),
        ];
        let paths: Vec<_> = dedup_files(files).into_iter().map(|f| f.path).collect();
        assert_eq!(paths, vec!["b.ts", "a.ts"]);
    }

    #[test]
    fn test_merge_ranges() {
        let merged = merge_ranges(vec![
            LineRange::new(10, 12),
            LineRange::new(1, 3),
            LineRange::new(3, 5),
        ]);
        assert_eq!(merged, vec![LineRange::new(1, 5), LineRange::new(10, 12)]);
    }

    #[test]
    fn test_symbols_last_write_wins() {
        let first = SymbolEntry::new("run", SymbolKind::Function, "main.rs", 1);
        let other = SymbolEntry::new("stop", SymbolKind::Function, "main.rs", 9);
        let mut second = first.clone();
        second.documentation = Some("Runs it.".to_string());

        let out = dedup_symbols(vec![first, other.clone(), second.clone()]);
        assert_eq!(out, vec![second, other]);
    }

    #[test]
    fn test_symbols_same_name_different_line_kept() {
        let a = SymbolEntry::new("new", SymbolKind::Method, "a.rs", 1);
        let b = SymbolEntry::new("new", SymbolKind::Method, "a.rs", 20);
        assert_eq!(dedup_symbols(vec![a, b]).len(), 2);
    }
}
