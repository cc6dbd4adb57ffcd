//! `svfmt` — the command-line front end for `sv_formatter`. Argument
//! parsing, config-file discovery, and file I/O live here; the core crate
//! never touches a filesystem path or a process exit code.

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use sv_formatter::{EnabledLines, ExecutionControl, FormatError, FormatStyle};

/// Format SystemVerilog source files in place, or check that they're
/// already formatted.
#[derive(Parser)]
#[command(name = "svfmt", version, about)]
struct Cli {
    /// Files to format. Reads from stdin when empty.
    files: Vec<PathBuf>,

    /// Check formatting without writing; exit non-zero if any file would change.
    #[arg(long)]
    check: bool,

    /// Name to report for stdin input and to use for config discovery.
    #[arg(long)]
    stdin_filename: Option<PathBuf>,

    /// Path to an explicit `sv_format.toml`, bypassing discovery.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sv_format=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("svfmt: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    if cli.files.is_empty() {
        return run_stdin(cli);
    }

    // `spec.md`'s Non-goals rule out cross-file parallelism; files are
    // processed one at a time in argument order.
    let mut any_changed = false;
    let mut any_failed = false;

    for path in &cli.files {
        let style = resolve_style(cli, path)?;
        match format_file(path, &style, cli.check) {
            Ok(FileResult::Unchanged) => {}
            Ok(FileResult::Changed) => any_changed = true,
            Ok(FileResult::ResourceExhausted) => {
                any_changed = true;
                tracing::warn!(path = %path.display(), "formatting hit the search-state budget");
            }
            Err(err) => {
                any_failed = true;
                eprintln!("svfmt: {}: {err:#}", path.display());
            }
        }
    }

    if any_failed {
        return Ok(ExitCode::from(1));
    }
    if cli.check && any_changed {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_stdin(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;

    let style = match &cli.config {
        Some(explicit) => config::load_explicit(explicit)?,
        None => match &cli.stdin_filename {
            Some(name) => config::discover(name)?,
            None => FormatStyle::default(),
        },
    };

    let result = format_source_text(&source, &style)?;
    if cli.check {
        let changed = result.formatted != source;
        return Ok(ExitCode::from(u8::from(changed)));
    }
    print!("{}", result.formatted);
    Ok(ExitCode::SUCCESS)
}

fn resolve_style(cli: &Cli, path: &Path) -> anyhow::Result<FormatStyle> {
    match &cli.config {
        Some(explicit) => config::load_explicit(explicit),
        None => config::discover(path),
    }
}

enum FileResult {
    Unchanged,
    Changed,
    ResourceExhausted,
}

fn format_file(path: &Path, style: &FormatStyle, check: bool) -> anyhow::Result<FileResult> {
    let source = fs::read_to_string(path)?;
    let result = format_source_text(&source, style)?;
    let changed = write_if_needed(path, &source, &result.formatted, check)?;

    Ok(if result.resource_exhausted {
        FileResult::ResourceExhausted
    } else if changed {
        FileResult::Changed
    } else {
        FileResult::Unchanged
    })
}

/// Writes `formatted` over `path` unless it's identical to `original` or
/// `check` mode is active (which never writes). Returns whether the
/// content differs.
fn write_if_needed(path: &Path, original: &str, formatted: &str, check: bool) -> anyhow::Result<bool> {
    if formatted == original {
        return Ok(false);
    }
    if !check {
        fs::write(path, formatted)?;
    }
    Ok(true)
}

/// The result of one `format_source_text` call. `resource_exhausted` mirrors
/// `FormatError::ResourceExhausted`: a soft failure carrying best-effort
/// text rather than a hard error (`spec.md` §7).
struct FormattedText {
    formatted: String,
    resource_exhausted: bool,
}

#[tracing::instrument(level = "debug", skip_all)]
fn format_source_text(source: &str, style: &FormatStyle) -> anyhow::Result<FormattedText> {
    let text_structure =
        sv_syntax::build_text_structure(source).map_err(|err| anyhow::anyhow!("input failed to parse: {err}"))?;

    let mut execution = ExecutionControl::default();
    match sv_formatter::format_module(&text_structure, style, &EnabledLines::all(), &mut execution) {
        Ok(outcome) => Ok(FormattedText {
            formatted: outcome.formatted,
            resource_exhausted: false,
        }),
        Err(FormatError::ResourceExhausted { outcome }) => Ok(FormattedText {
            formatted: outcome.formatted,
            resource_exhausted: true,
        }),
        Err(err) => Err(anyhow::anyhow!("{err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_if_needed_reports_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.sv");
        fs::write(&path, "module m;endmodule\n").unwrap();
        let changed = write_if_needed(&path, "module m;endmodule\n", "module m;endmodule\n", false).unwrap();
        assert!(!changed);
    }

    #[test]
    fn write_if_needed_skips_disk_write_in_check_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.sv");
        fs::write(&path, "module m;\nendmodule\n").unwrap();
        let changed = write_if_needed(&path, "module m;\nendmodule\n", "module m;endmodule\n", true).unwrap();
        assert!(changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "module m;\nendmodule\n");
    }

    #[test]
    fn format_source_text_reports_resource_exhausted_as_soft_failure() {
        // A style with a zero search-state budget can't even be expressed
        // through `ExecutionControl::default()` here, so this just checks
        // the ordinary path returns a non-exhausted result.
        let result = format_source_text("module m;assign x=a;endmodule\n", &FormatStyle::default()).unwrap();
        assert!(!result.resource_exhausted);
        assert!(result.formatted.contains("assign x = a;"));
    }
}
