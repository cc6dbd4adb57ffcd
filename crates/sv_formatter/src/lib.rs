//! The formatting core's public entry points: `format_module`, for callers
//! that already hold a [`sv_syntax::TextStructure`] (an editor integration
//! reusing a cached parse), and `format_source`, the convenience wrapper
//! that builds one from raw text (`spec.md` §2, §6).
//!
//! The pipeline is always annotate -> resolve/apply disabled ranges ->
//! unwrap -> layout -> emit -> verify, each stage instrumented with a
//! `tracing` span so a caller with a subscriber installed can see where
//! time (or a cancellation) landed.

pub mod annotate;
pub mod disabled_ranges;
mod diagnostics;
pub mod emit;
pub mod error;
pub mod execution;
pub mod layout;
pub mod model;
pub mod search;
pub mod style;
pub mod tree;
pub mod verify;

use sv_syntax::{Cst, Token, TextStructure};
use sv_text_size::LineIndex;

pub use error::{FormatError, FormatOutcome};
pub use execution::{EnabledLines, ExecutionControl, LineRange};
pub use style::{CaseItemIndentation, FormatStyle};

use disabled_ranges::DisabledRanges;
use emit::{EmitOptions, EmitOutcome};
use layout::LaidOutLine;
use model::FormatToken;
use tree::TokenPartitionTree;

/// Formats one already-parsed source file.
///
/// `text_structure` and `enabled_lines` are read-only; `execution` carries
/// the search-state budget, diagnostic opt-ins, and the cooperative
/// cancellation flag, and is checked between every pipeline stage so a
/// caller cancelling mid-format gets a prompt `FormatError::Cancelled`
/// rather than waiting out a large file.
pub fn format_module(
    text_structure: &TextStructure<'_>,
    style: &FormatStyle,
    enabled_lines: &EnabledLines,
    execution: &mut ExecutionControl<'_>,
) -> Result<FormatOutcome, FormatError> {
    let source = text_structure.source;
    let mut tokens = model::build_format_tokens(&text_structure.tokens);

    run_annotator(&mut tokens, &text_structure.cst, source, style);
    if execution.is_cancelled() {
        return Err(FormatError::Cancelled);
    }

    let disabled = run_disabled_ranges(
        source,
        &text_structure.tokens,
        &text_structure.cst,
        &text_structure.line_index,
        style,
        enabled_lines,
    );
    disabled_ranges::apply(&mut tokens, &disabled);

    let tree = run_unwrap(&text_structure.cst, &tokens, style);
    if execution.is_cancelled() {
        return Err(FormatError::Cancelled);
    }

    let lines = run_layout(&tree, &tokens, source, style);

    if execution.show_token_partition_tree || execution.show_largest_token_partitions > 0 {
        if let Some(sink) = execution.diagnostics.as_deref_mut() {
            if execution.show_token_partition_tree {
                diagnostics::write_token_partition_tree(&tree, sink);
            }
            if execution.show_largest_token_partitions > 0 {
                diagnostics::write_largest_token_partitions(&lines, execution.show_largest_token_partitions, sink);
            }
        }
    }

    if execution.is_cancelled() {
        return Err(FormatError::Cancelled);
    }

    let emit_outcome = run_emit(
        &lines,
        &tokens,
        source,
        style,
        execution.max_search_states,
        EmitOptions {
            parallel: execution.parallel,
            show_equally_optimal_wrappings: execution.show_equally_optimal_wrappings,
            diagnostics: execution.diagnostics.as_deref_mut(),
        },
    );

    // `any_stop` defers cancellation until here so every requested
    // diagnostic (including the wrap search's equally-optimal-wrappings
    // count, only known once `emit` has run) has had a chance to write.
    if execution.any_stop && execution.wants_diagnostics() {
        return Err(FormatError::Cancelled);
    }

    if execution.is_cancelled() {
        return Err(FormatError::Cancelled);
    }

    run_verify(source, &text_structure.tokens, &emit_outcome.text)?;

    if !emit_outcome.completed {
        return Err(FormatError::ResourceExhausted {
            outcome: FormatOutcome::ok(emit_outcome.text),
        });
    }

    Ok(FormatOutcome::ok(emit_outcome.text))
}

/// Lexes and parses `source` and formats it with a default
/// [`ExecutionControl`] (no diagnostics, everything enabled, sequential
/// search). Most callers without an existing parse reach for this.
pub fn format_source(source: &str, style: &FormatStyle) -> Result<FormatOutcome, FormatError> {
    let text_structure = sv_syntax::build_text_structure(source).map_err(|err| FormatError::InvalidInput {
        errors: vec![err.to_string()],
    })?;
    let mut execution = ExecutionControl::default();
    format_module(&text_structure, style, &EnabledLines::all(), &mut execution)
}

#[tracing::instrument(name = "annotator", level = "debug", skip_all)]
fn run_annotator(tokens: &mut [FormatToken], cst: &Cst, source: &str, style: &FormatStyle) {
    annotate::annotate(tokens, cst, source, style);
}

#[tracing::instrument(name = "disabled_ranges", level = "debug", skip_all)]
fn run_disabled_ranges(
    source: &str,
    tokens: &[Token],
    cst: &Cst,
    line_index: &LineIndex,
    style: &FormatStyle,
    enabled_lines: &EnabledLines,
) -> DisabledRanges {
    disabled_ranges::resolve(source, tokens, cst, line_index, style, enabled_lines)
}

#[tracing::instrument(name = "unwrap", level = "debug", skip_all)]
fn run_unwrap(cst: &Cst, tokens: &[FormatToken], style: &FormatStyle) -> TokenPartitionTree {
    tree::unwrap_tree(cst, tokens, style)
}

#[tracing::instrument(name = "layout_search", level = "debug", skip_all)]
fn run_layout(tree: &TokenPartitionTree, tokens: &[FormatToken], source: &str, style: &FormatStyle) -> Vec<LaidOutLine> {
    layout::lay_out(tree, tokens, source, style)
}

#[tracing::instrument(name = "emit", level = "debug", skip_all)]
fn run_emit(
    lines: &[LaidOutLine],
    tokens: &[FormatToken],
    source: &str,
    style: &FormatStyle,
    max_search_states: usize,
    options: EmitOptions<'_>,
) -> EmitOutcome {
    emit::emit_with_options(lines, tokens, source, style, max_search_states, options)
}

#[tracing::instrument(name = "verify", level = "trace", skip_all)]
fn run_verify(source: &str, tokens: &[Token], formatted: &str) -> Result<(), FormatError> {
    verify::verify(source, tokens, formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_trivial_module() {
        let outcome = format_source("module m;assign x=a;endmodule\n", &FormatStyle::default()).unwrap();
        assert_eq!(outcome.formatted, "module m;\n  assign x = a;\nendmodule\n");
    }

    #[test]
    fn formatting_is_idempotent() {
        let style = FormatStyle::default();
        let once = format_source("module m;assign x=a;endmodule\n", &style).unwrap();
        let twice = format_source(&once.formatted, &style).unwrap();
        assert_eq!(once.formatted, twice.formatted);
    }

    #[test]
    fn invalid_input_is_rejected_before_formatting() {
        let result = format_source("module m(;\n", &FormatStyle::default());
        assert!(matches!(result, Err(FormatError::InvalidInput { .. })));
    }

    #[test]
    fn cancellation_is_observed_before_emit() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let source = "module m;assign x=a;endmodule\n";
        let structure = sv_syntax::build_text_structure(source).unwrap();
        let cancel = Arc::new(AtomicBool::new(true));
        let mut execution = ExecutionControl {
            cancel,
            ..ExecutionControl::default()
        };
        let result = format_module(&structure, &FormatStyle::default(), &EnabledLines::all(), &mut execution);
        assert!(matches!(result, Err(FormatError::Cancelled)));
    }

    #[test]
    fn diagnostics_are_written_to_the_caller_supplied_sink() {
        let source = "module m;assign x=a;endmodule\n";
        let structure = sv_syntax::build_text_structure(source).unwrap();
        let mut buf: Vec<u8> = Vec::new();
        let mut execution = ExecutionControl {
            show_token_partition_tree: true,
            diagnostics: Some(&mut buf),
            ..ExecutionControl::default()
        };
        let outcome = format_module(&structure, &FormatStyle::default(), &EnabledLines::all(), &mut execution).unwrap();
        assert!(outcome.formatted.contains("assign"));
        drop(execution);
        assert!(String::from_utf8(buf).unwrap().contains("token-partition tree"));
    }
}
