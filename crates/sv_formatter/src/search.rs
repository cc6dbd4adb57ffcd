//! Per-line wrap search — the dynamic-programming line-breaking stage
//! that turns one [`LaidOutLine`](crate::layout::LaidOutLine) into
//! formatted text (`spec.md` §4.4.2).
//!
//! The state graph is a DAG ordered by token position (state `k` only
//! transitions to state `k + 1`), so the search is a straightforward
//! forward sweep rather than a priority-queue Dijkstra: at each token we
//! only need last layer's surviving states. States are deduplicated by
//! resulting column and pruned to a bounded frontier width, which is what
//! keeps the per-line state count inside `max_search_states`.

use crate::layout::LaidOutLine;
use crate::model::{BreakDecision, FormatToken};
use crate::style::FormatStyle;

/// Frontier width kept per token position after dedup/pruning. Bounds the
/// work per token independent of the overall `max_search_states` budget,
/// which instead tracks the running total across the whole line.
const BEAM_WIDTH: usize = 24;

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub text: String,
    /// `false` once the running state count crossed `max_search_states`;
    /// the text is still the best the search found under the bounded
    /// frontier (`spec.md` §7 "non-fatal ... soft failure").
    pub completed: bool,
    /// How many final-layer states tied the winning `(cost, wraps,
    /// first_wrap)` key. `spec.md` §4.4.2: "If multiple optimal paths
    /// exist, all are retained (for an optional diagnostic mode); the first
    /// is chosen for emission." Retaining every tied path's rendered text
    /// for a diagnostic nobody reads by default would multiply the state
    /// budget for no benefit, so only the count is kept; `show_equally_
    /// optimal_wrappings` reports it without requiring full path storage.
    pub tied_optimal: usize,
}

#[derive(Clone, Copy)]
enum Transition {
    Append,
    Wrap,
    WrapDedent,
    Preserve,
}

#[derive(Clone, Copy)]
struct State {
    column: u32,
    cost: u64,
    wraps: u32,
    first_wrap: u32,
    pred: usize,
    taken: Transition,
}

fn key(s: &State) -> (u64, u32, u32) {
    (s.cost, s.wraps, s.first_wrap)
}

/// Runs the wrap search for one laid-out line and renders the chosen path
/// to text (without a trailing newline; the emitter adds line separators).
pub fn search_line(
    line: LaidOutLine,
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    max_search_states: usize,
) -> SearchOutcome {
    let len = line.len();
    debug_assert!(len > 0, "search_line called on an empty line");

    let first = &tokens[line.start as usize];
    let mut layers: Vec<Vec<State>> = Vec::with_capacity(len);
    layers.push(vec![State {
        column: line.indentation_spaces + first.width(source),
        cost: 0,
        wraps: 0,
        first_wrap: u32::MAX,
        pred: usize::MAX,
        taken: Transition::Append,
    }]);

    let mut states_created = 0usize;
    let mut completed = true;

    for k in 1..len {
        let token = &tokens[(line.start as usize) + k];
        let decision = token.before.break_decision;
        let prev_layer = &layers[k - 1];

        let mut candidates: Vec<State> = Vec::with_capacity(prev_layer.len() * 2);
        for (pred_idx, prev) in prev_layer.iter().enumerate() {
            let allowed: &[Transition] = match decision {
                BreakDecision::MustAppend => &[Transition::Append],
                BreakDecision::MustWrap => &[Transition::Wrap],
                BreakDecision::MustWrapDedent => &[Transition::WrapDedent],
                BreakDecision::PreserveOriginal => &[Transition::Preserve],
                BreakDecision::Undecided => &[Transition::Append, Transition::Wrap],
            };
            for &transition in allowed {
                states_created += 1;
                candidates.push(apply_transition(
                    transition, prev, pred_idx, token, line, tokens, source, style, k,
                ));
            }
        }

        if states_created > max_search_states {
            completed = false;
        }

        layers.push(prune(candidates));
    }

    let last_layer = layers.last().expect("at least one layer always present");
    let (best_idx, best) = last_layer
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| key(s))
        .expect("non-empty final layer");
    let best_key = key(best);
    let tied_optimal = last_layer.iter().filter(|s| key(s) == best_key).count();

    let breaks = reconstruct(&layers, best_idx);
    let text = render(line, &breaks, tokens, source, style);

    SearchOutcome {
        text,
        completed,
        tied_optimal,
    }
}

/// Runs [`search_line`] for every non-empty line in `lines`, spreading the
/// work across a `std::thread::scope` worker pool indexed by worklist
/// position (`spec.md` §5: "per-unwrapped-line searches are trivially
/// parallelizable ... provided results are written into a pre-sized ordered
/// buffer indexed by worklist position"). Falls back to sequential
/// execution when there's only one line or one available core, since
/// spawning threads for a handful of short lines is pure overhead.
pub fn search_lines_parallel(
    lines: &[LaidOutLine],
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    max_search_states: usize,
) -> Vec<Option<SearchOutcome>> {
    let worker_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(lines.len().max(1));

    let mut results: Vec<Option<SearchOutcome>> = (0..lines.len()).map(|_| None).collect();

    if worker_count <= 1 {
        for (slot, line) in results.iter_mut().zip(lines) {
            if !line.is_empty() {
                *slot = Some(search_line(*line, tokens, source, style, max_search_states));
            }
        }
        return results;
    }

    let chunk_size = lines.len().div_ceil(worker_count).max(1);
    std::thread::scope(|scope| {
        for (line_chunk, result_chunk) in lines.chunks(chunk_size).zip(results.chunks_mut(chunk_size)) {
            scope.spawn(move || {
                for (line, slot) in line_chunk.iter().zip(result_chunk.iter_mut()) {
                    if !line.is_empty() {
                        *slot = Some(search_line(*line, tokens, source, style, max_search_states));
                    }
                }
            });
        }
    });

    results
}

#[allow(clippy::too_many_arguments)]
fn apply_transition(
    transition: Transition,
    prev: &State,
    pred_idx: usize,
    token: &FormatToken,
    line: LaidOutLine,
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    k: usize,
) -> State {
    match transition {
        Transition::Append => {
            let column = prev.column + token.before.spaces_required + token.width(source);
            State {
                column,
                cost: prev.cost + overflow_penalty(column, style),
                wraps: prev.wraps,
                first_wrap: prev.first_wrap,
                pred: pred_idx,
                taken: Transition::Append,
            }
        }
        Transition::Wrap => {
            let column = line.indentation_spaces + style.wrap_spaces + token.width(source);
            let cost = prev.cost + token.before.break_penalty as u64 + overflow_penalty(column, style);
            State {
                column,
                cost,
                wraps: prev.wraps + 1,
                first_wrap: prev.first_wrap.min(k as u32),
                pred: pred_idx,
                taken: Transition::Wrap,
            }
        }
        Transition::WrapDedent => {
            let column = line.indentation_spaces + token.width(source);
            let cost = prev.cost + token.before.break_penalty as u64 + overflow_penalty(column, style);
            State {
                column,
                cost,
                wraps: prev.wraps + 1,
                first_wrap: prev.first_wrap.min(k as u32),
                pred: pred_idx,
                taken: Transition::WrapDedent,
            }
        }
        Transition::Preserve => {
            let prev_end = tokens[(line.start as usize) + k - 1].token.range.end();
            let cur_start = token.token.range.start();
            let gap = &source[prev_end.to_usize()..cur_start.to_usize()];
            let trailing = gap.rsplit('\n').next().unwrap_or(gap);
            let column = if gap.contains('\n') {
                unicode_width::UnicodeWidthStr::width(trailing) as u32 + token.width(source)
            } else {
                prev.column + unicode_width::UnicodeWidthStr::width(gap) as u32 + token.width(source)
            };
            State {
                column,
                cost: prev.cost,
                wraps: prev.wraps,
                first_wrap: prev.first_wrap,
                pred: pred_idx,
                taken: Transition::Preserve,
            }
        }
    }
}

fn overflow_penalty(column: u32, style: &FormatStyle) -> u64 {
    u64::from(column.saturating_sub(style.column_limit)) * u64::from(style.over_column_limit_penalty)
}

/// Deduplicates by resulting column (keeping the cheapest, tie-broken by
/// fewer wraps then the earliest wrap position) and bounds the frontier to
/// `BEAM_WIDTH` states, lowest-cost first.
fn prune(mut candidates: Vec<State>) -> Vec<State> {
    candidates.sort_by_key(|s| (s.column, key(s)));
    let mut deduped: Vec<State> = Vec::with_capacity(candidates.len());
    for state in candidates {
        if deduped.last().is_some_and(|last: &State| last.column == state.column) {
            continue;
        }
        deduped.push(state);
    }
    deduped.sort_by_key(key);
    deduped.truncate(BEAM_WIDTH);
    deduped
}

fn reconstruct(layers: &[Vec<State>], mut idx: usize) -> Vec<Transition> {
    let mut breaks = vec![Transition::Append; layers.len()];
    for k in (0..layers.len()).rev() {
        let state = layers[k][idx];
        breaks[k] = state.taken;
        idx = state.pred;
    }
    breaks
}

fn render(
    line: LaidOutLine,
    breaks: &[Transition],
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
) -> String {
    let mut text = String::new();
    text.push_str(&" ".repeat(line.indentation_spaces as usize));
    text.push_str(tokens[line.start as usize].text(source));

    for k in 1..breaks.len() {
        let token = &tokens[(line.start as usize) + k];
        match breaks[k] {
            Transition::Append => {
                text.push_str(&" ".repeat(token.before.spaces_required as usize));
                text.push_str(token.text(source));
            }
            Transition::Wrap => {
                text.push('\n');
                let indent = (line.indentation_spaces + style.wrap_spaces) as usize;
                text.push_str(&" ".repeat(indent));
                text.push_str(token.text(source));
            }
            Transition::WrapDedent => {
                text.push('\n');
                text.push_str(&" ".repeat(line.indentation_spaces as usize));
                text.push_str(token.text(source));
            }
            Transition::Preserve => {
                let prev_end = tokens[(line.start as usize) + k - 1].token.range.end();
                let cur_start = token.token.range.start();
                text.push_str(&source[prev_end.to_usize()..cur_start.to_usize()]);
                text.push_str(token.text(source));
            }
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate;
    use crate::execution::DEFAULT_MAX_SEARCH_STATES;
    use crate::layout::lay_out;
    use crate::model::build_format_tokens;
    use crate::tree::unwrap_tree;
    use sv_syntax::build_text_structure;

    #[test]
    fn short_line_fits_without_wrapping() {
        let source = "assign x = a;\n";
        let structure = build_text_structure(source).unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);
        let tree = unwrap_tree(&structure.cst, &tokens, &style);
        let lines = lay_out(&tree, &tokens, structure.source, &style);

        let line = lines[0];
        let outcome = search_line(line, &tokens, structure.source, &style, DEFAULT_MAX_SEARCH_STATES);
        assert!(!outcome.text.contains('\n'));
        assert!(outcome.completed);
    }

    #[test]
    fn parallel_search_matches_sequential_results() {
        let source = "module m;\nassign x = a;\nassign y = b;\nassign z = c;\nendmodule\n";
        let structure = build_text_structure(source).unwrap();
        let mut tokens = build_format_tokens(&structure.tokens);
        let style = FormatStyle::default();
        annotate(&mut tokens, &structure.cst, structure.source, &style);
        let tree = unwrap_tree(&structure.cst, &tokens, &style);
        let lines = lay_out(&tree, &tokens, structure.source, &style);

        let parallel = search_lines_parallel(&lines, &tokens, structure.source, &style, DEFAULT_MAX_SEARCH_STATES);
        for (line, outcome) in lines.iter().zip(parallel.iter()) {
            if line.is_empty() {
                assert!(outcome.is_none());
                continue;
            }
            let sequential = search_line(*line, &tokens, structure.source, &style, DEFAULT_MAX_SEARCH_STATES);
            assert_eq!(outcome.as_ref().unwrap().text, sequential.text);
        }
    }
}
