//! Error taxonomy (`spec.md` §7, ambient `thiserror` shape per SPEC_FULL §7).

use thiserror::Error;

/// The successful result of one `format_module` call.
#[derive(Debug, Clone)]
pub struct FormatOutcome {
    pub formatted: String,
}

impl FormatOutcome {
    pub fn ok(formatted: String) -> Self {
        Self { formatted }
    }
}

/// The distinguishable error kinds the core can surface. `spec.md` also
/// lists `OK` as a kind; that case is represented by `Ok(FormatOutcome)`
/// rather than a variant here.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The input failed to lex/parse upstream; the core refuses to run.
    #[error("input failed to parse: {}", .errors.join("; "))]
    InvalidInput { errors: Vec<String> },

    /// One or more unwrapped lines hit `max_search_states`. Carries the
    /// best-effort formatted text so the caller can still display it
    /// (`spec.md` §7: "non-fatal warning or a soft failure").
    #[error("formatting hit the search-state budget on at least one line")]
    ResourceExhausted { outcome: FormatOutcome },

    /// The verifier found the output is not lexically equivalent to the
    /// input. Always fatal; the caller must emit the original text.
    #[error("formatted output is not lexically equivalent to the input: {detail}")]
    DataLoss { detail: String },

    /// A diagnostic-stop was requested, or the cooperative cancellation flag
    /// was observed set.
    #[error("formatting was cancelled")]
    Cancelled,
}
