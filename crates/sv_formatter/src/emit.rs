//! Emitter — walks the laid-out lines in source order, splicing formatted
//! excerpts together with verbatim-copied disabled-range text and capping
//! blank-line runs (`spec.md` §4.5).

use std::io::Write;

use crate::layout::LaidOutLine;
use crate::model::{BreakDecision, FormatToken};
use crate::search::{search_line, search_lines_parallel, SearchOutcome};
use crate::style::FormatStyle;

pub struct EmitOutcome {
    pub text: String,
    /// `false` if any line's wrap search hit the state budget.
    pub completed: bool,
}

/// Ambient knobs for one [`emit_with_options`] call: whether to spread the
/// per-line wrap searches across a worker pool (`spec.md` §5) and where to
/// write the `show_equally_optimal_wrappings` diagnostic (`spec.md` §6).
/// Never a global — the caller always supplies the sink.
#[derive(Default)]
pub struct EmitOptions<'a> {
    pub parallel: bool,
    pub show_equally_optimal_wrappings: bool,
    pub diagnostics: Option<&'a mut dyn Write>,
}

/// Renders every line and joins them, treating a line as verbatim (copied
/// byte-for-byte, including its leading whitespace) the moment any of its
/// tokens carries a `PreserveOriginal` decision — the disabled-range
/// resolver only ever marks whole statements this way in practice, so
/// falling back to "the whole line is verbatim" rather than mixing
/// verbatim and formatted spacing within one line keeps this simple
/// without losing fidelity.
pub fn emit(
    lines: &[LaidOutLine],
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    max_search_states: usize,
) -> EmitOutcome {
    emit_with_options(lines, tokens, source, style, max_search_states, EmitOptions::default())
}

/// Same as [`emit`] but runs the per-line wrap searches on a worker pool
/// (`spec.md` §5's optional parallelism, `ExecutionControl::parallel`).
pub fn emit_parallel(
    lines: &[LaidOutLine],
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    max_search_states: usize,
) -> EmitOutcome {
    emit_with_options(
        lines,
        tokens,
        source,
        style,
        max_search_states,
        EmitOptions {
            parallel: true,
            ..EmitOptions::default()
        },
    )
}

pub fn emit_with_options(
    lines: &[LaidOutLine],
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    max_search_states: usize,
    mut options: EmitOptions<'_>,
) -> EmitOutcome {
    let precomputed: Option<Vec<Option<SearchOutcome>>> = options
        .parallel
        .then(|| search_lines_parallel(lines, tokens, source, style, max_search_states));

    let mut out = String::new();
    let mut completed = true;
    let mut prev_end: Option<usize> = None;
    // Only populated when `style.align_trailing_comments` is set: each
    // inner vec is a maximal run of consecutive lines that each carry a
    // trailing comment, recording `(line_start_byte, comment_col)` so a
    // second pass can pad every comment in the run to the same column.
    let mut comment_runs: Vec<Vec<(usize, usize)>> = Vec::new();
    let mut run_break = true;

    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let is_verbatim = tokens[line.start as usize..line.end as usize]
            .iter()
            .any(|t| t.before.break_decision == BreakDecision::PreserveOriginal);

        let line_end_byte = tokens[(line.end - 1) as usize].token.range.end().to_usize();

        if is_verbatim {
            let start = prev_end.unwrap_or_else(|| tokens[line.start as usize].token.range.start().to_usize());
            out.push_str(&source[start..line_end_byte]);
            prev_end = Some(line_end_byte);
            run_break = true;
            continue;
        }

        if let Some(prev) = prev_end {
            let gap_start = tokens[line.start as usize].token.range.start().to_usize();
            let blank_lines = count_blank_lines(&source[prev..gap_start]).min(style.max_blank_lines);
            out.push('\n');
            for _ in 0..blank_lines {
                out.push('\n');
            }
            if blank_lines > 0 {
                run_break = true;
            }
        }

        let outcome = match &precomputed {
            Some(results) => results[index]
                .clone()
                .expect("non-empty line always produces a search outcome"),
            None => search_line(*line, tokens, source, style, max_search_states),
        };
        if !outcome.completed {
            completed = false;
        }
        if options.show_equally_optimal_wrappings && outcome.tied_optimal > 1 {
            if let Some(sink) = options.diagnostics.as_deref_mut() {
                let _ = writeln!(
                    sink,
                    "line at token {} has {} equally optimal wrappings",
                    line.start, outcome.tied_optimal
                );
            }
        }

        let line_start_in_out = out.len();
        if style.align_trailing_comments {
            let last_token = &tokens[(line.end - 1) as usize];
            let trailing = (last_token.kind().is_comment()
                && last_token.before.break_decision == BreakDecision::MustAppend)
                .then(|| outcome.text.len() - last_token.text(source).len());
            match trailing {
                Some(col) => {
                    if run_break {
                        comment_runs.push(Vec::new());
                    }
                    comment_runs.last_mut().unwrap().push((line_start_in_out, col));
                    run_break = false;
                }
                None => run_break = true,
            }
        }
        out.push_str(&outcome.text);
        prev_end = Some(line_end_byte);
    }

    out.push('\n');

    if style.align_trailing_comments {
        // Later runs start at higher byte offsets than earlier ones,
        // and insertions only ever shift bytes after the insertion
        // point, so processing runs (and lines within a run) back to
        // front keeps every not-yet-processed offset valid.
        for run in comment_runs.iter().rev() {
            let target = run.iter().map(|&(_, col)| col).max().unwrap_or(0);
            for &(line_start, col) in run.iter().rev() {
                if col < target {
                    out.insert_str(line_start + col, &" ".repeat(target - col));
                }
            }
        }
    }

    EmitOutcome { text: out, completed }
}

/// The number of fully blank lines a gap of original source contains,
/// i.e. one less than its newline count (a gap with exactly one newline
/// separates two adjacent non-blank lines).
fn count_blank_lines(gap: &str) -> u32 {
    let newlines = gap.bytes().filter(|&b| b == b'\n').count();
    newlines.saturating_sub(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate;
    use crate::disabled_ranges;
    use crate::execution::{EnabledLines, DEFAULT_MAX_SEARCH_STATES};
    use crate::layout::lay_out;
    use crate::model::build_format_tokens;
    use crate::tree::unwrap_tree;
    use sv_syntax::build_text_structure;

    #[test]
    fn caps_blank_lines_between_statements() {
        let source = "module m;\nassign x = a;\n\n\n\n\nassign y = b;\nendmodule\n";
        let structure = build_text_structure(source).unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);
        let tree = unwrap_tree(&structure.cst, &tokens, &style);
        let lines = lay_out(&tree, &tokens, structure.source, &style);

        let outcome = emit(&lines, &tokens, structure.source, &style, DEFAULT_MAX_SEARCH_STATES);
        assert!(outcome.completed);
        // 4 blank source lines get capped at `max_blank_lines` (2).
        assert!(!outcome.text.contains("\n\n\n\n"));
    }

    #[test]
    fn aligns_trailing_comments_within_a_run_when_enabled() {
        let source = "module m;\nassign x = a; // short\nassign long_name = b; // note\nendmodule\n";
        let structure = build_text_structure(source).unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle {
            align_trailing_comments: true,
            ..FormatStyle::default()
        };
        annotate(&mut tokens, &structure.cst, structure.source, &style);
        let tree = unwrap_tree(&structure.cst, &tokens, &style);
        let lines = lay_out(&tree, &tokens, structure.source, &style);

        let outcome = emit(&lines, &tokens, structure.source, &style, DEFAULT_MAX_SEARCH_STATES);
        let comment_cols: Vec<usize> = outcome
            .text
            .lines()
            .filter_map(|l| l.find("//"))
            .collect();
        assert_eq!(comment_cols.len(), 2);
        assert_eq!(comment_cols[0], comment_cols[1]);
    }

    #[test]
    fn disabled_region_is_copied_verbatim() {
        let source = "module m;\n// verilog_format: off\nassign    x=a  ;\n// verilog_format: on\nendmodule\n";
        let structure = build_text_structure(source).unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);
        let disabled = disabled_ranges::resolve(
            structure.source,
            &structure.tokens,
            &structure.cst,
            &structure.line_index,
            &style,
            &EnabledLines::all(),
        );
        disabled_ranges::apply(&mut tokens, &disabled);
        let tree = unwrap_tree(&structure.cst, &tokens, &style);
        let lines = lay_out(&tree, &tokens, structure.source, &style);

        let outcome = emit(&lines, &tokens, structure.source, &style, DEFAULT_MAX_SEARCH_STATES);
        assert!(outcome.text.contains("assign    x=a  ;"));
    }
}
