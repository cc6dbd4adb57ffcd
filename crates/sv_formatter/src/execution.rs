//! Caller-supplied execution knobs: which lines are enabled, the
//! search-state budget, diagnostic opt-ins, and cooperative cancellation
//! (`spec.md` §5, §6).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sv_text_size::{OneIndexed, TextRange};

/// A half-open, 1-based line interval `[lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub lo: OneIndexed,
    pub hi: OneIndexed,
}

/// The set of lines the caller wants formatted. An empty set means "format
/// everything" (`spec.md` §6).
#[derive(Debug, Clone, Default)]
pub struct EnabledLines {
    ranges: Vec<LineRange>,
}

impl EnabledLines {
    pub fn all() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn new(mut ranges: Vec<LineRange>) -> Self {
        ranges.sort_by_key(|r| r.lo);
        Self { ranges }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains_line(&self, line: OneIndexed) -> bool {
        if self.ranges.is_empty() {
            return true;
        }
        self.ranges.iter().any(|r| r.lo <= line && line < r.hi)
    }

    pub fn ranges(&self) -> &[LineRange] {
        &self.ranges
    }
}

/// Default budget for the per-line wrap search: "the tens of thousands"
/// (`spec.md` §4.4.2).
pub const DEFAULT_MAX_SEARCH_STATES: usize = 40_000;

/// Execution controls: the search budget, diagnostic opt-ins, and the
/// cooperative cancellation flag (`spec.md` §5, §6).
pub struct ExecutionControl<'a> {
    pub max_search_states: usize,
    pub show_token_partition_tree: bool,
    pub show_largest_token_partitions: usize,
    pub show_equally_optimal_wrappings: bool,
    /// When set alongside any `show_*` diagnostic, the engine writes
    /// diagnostics and returns `Cancelled` without writing formatted text.
    pub any_stop: bool,
    /// Ambient addition (`spec.md` §5 "MAY run ... on a worker pool"): run
    /// each unwrapped line's wrap search on a `std::thread::scope` worker
    /// pool instead of sequentially. Defaults to `false` since the spec says
    /// "MAY", not "must".
    pub parallel: bool,
    /// Cooperative cancellation, checked at each search-state expansion and
    /// between unwrapped lines. Cloning the `Arc` lets a caller cancel from
    /// another thread.
    pub cancel: Arc<AtomicBool>,
    /// Diagnostic output sink for `show_*` options. `None` silently drops
    /// diagnostics even if `any_stop` requests them.
    pub diagnostics: Option<&'a mut dyn Write>,
}

impl<'a> ExecutionControl<'a> {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn wants_diagnostics(&self) -> bool {
        self.show_token_partition_tree
            || self.show_largest_token_partitions > 0
            || self.show_equally_optimal_wrappings
    }
}

impl<'a> Default for ExecutionControl<'a> {
    fn default() -> Self {
        Self {
            max_search_states: DEFAULT_MAX_SEARCH_STATES,
            show_token_partition_tree: false,
            show_largest_token_partitions: 0,
            show_equally_optimal_wrappings: false,
            any_stop: false,
            parallel: false,
            cancel: Arc::new(AtomicBool::new(false)),
            diagnostics: None,
        }
    }
}

/// Converts an enabled-line set to its complement in byte offsets — the
/// disabled ranges the resolver must add (`spec.md` §4.2, "Line-range
/// selection is converted via the line-column map").
pub(crate) fn enabled_lines_to_disabled_byte_ranges(
    enabled: &EnabledLines,
    line_index: &sv_text_size::LineIndex,
) -> Vec<TextRange> {
    if enabled.is_empty() {
        return Vec::new();
    }
    let total_lines = line_index.line_count();
    let mut disabled = Vec::new();
    let mut line = 1u32;
    while line <= total_lines {
        let one = OneIndexed::new(line).unwrap();
        if !enabled.contains_line(one) {
            let start = line_index.line_range(one).start();
            let mut end_line = line;
            while end_line + 1 <= total_lines
                && !enabled.contains_line(OneIndexed::new(end_line + 1).unwrap())
            {
                end_line += 1;
            }
            let end = line_index.line_range(OneIndexed::new(end_line).unwrap()).end();
            disabled.push(TextRange::new(start, end));
            line = end_line + 1;
        } else {
            line += 1;
        }
    }
    disabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_text_size::LineIndex;

    #[test]
    fn empty_enabled_lines_means_everything_enabled() {
        let enabled = EnabledLines::all();
        assert!(enabled.contains_line(OneIndexed::new(1).unwrap()));
        assert!(enabled.contains_line(OneIndexed::new(500).unwrap()));
    }

    #[test]
    fn complement_covers_gaps() {
        let index = LineIndex::from_source("a\nb\nc\nd\n");
        let enabled = EnabledLines::new(vec![LineRange {
            lo: OneIndexed::new(2).unwrap(),
            hi: OneIndexed::new(3).unwrap(),
        }]);
        let disabled = enabled_lines_to_disabled_byte_ranges(&enabled, &index);
        // Lines 1, 3, 4 are disabled; line 2 is enabled.
        assert_eq!(disabled.len(), 2);
    }
}
