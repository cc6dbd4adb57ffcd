//! `sv_format.toml` discovery and loading. The file's fields map directly
//! onto [`FormatStyle`]'s `serde` representation — there is no separate
//! wrapper schema, so any field the core gains is automatically
//! configurable from disk.

use std::fs;
use std::path::{Path, PathBuf};

use sv_formatter::FormatStyle;

const CONFIG_FILE_NAME: &str = "sv_format.toml";

/// Loads an explicitly-named config file. Unlike [`discover`], a missing or
/// unparsable file here is always an error — the user asked for this file
/// specifically.
pub fn load_explicit(path: &Path) -> anyhow::Result<FormatStyle> {
    let text = fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("failed to read config {}: {err}", path.display()))?;
    parse(&text, path)
}

/// Walks upward from `start`'s directory looking for `sv_format.toml`,
/// returning [`FormatStyle::default`] if none is found anywhere up to the
/// filesystem root.
pub fn discover(start: &Path) -> anyhow::Result<FormatStyle> {
    let mut dir = start_dir(start);
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            let text = fs::read_to_string(&candidate)
                .map_err(|err| anyhow::anyhow!("failed to read config {}: {err}", candidate.display()))?;
            return parse(&text, &candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => return Ok(FormatStyle::default()),
        }
    }
}

fn start_dir(start: &Path) -> PathBuf {
    if start.is_dir() {
        start.to_path_buf()
    } else {
        start.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    }
}

fn parse(text: &str, path: &Path) -> anyhow::Result<FormatStyle> {
    toml::from_str(text).map_err(|err| anyhow::anyhow!("failed to parse config {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_falls_back_to_default_with_no_config_present() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.sv");
        fs::write(&file, "module m;endmodule\n").unwrap();
        let style = discover(&file).unwrap();
        assert_eq!(style, FormatStyle::default());
    }

    #[test]
    fn discover_finds_config_in_an_ancestor_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("rtl/sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "column_limit = 80\n").unwrap();
        let file = nested.join("m.sv");
        fs::write(&file, "module m;endmodule\n").unwrap();

        let style = discover(&file).unwrap();
        assert_eq!(style.column_limit, 80);
    }

    #[test]
    fn load_explicit_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("bad.toml");
        fs::write(&config, "column_limit = \"not a number\"\n").unwrap();
        assert!(load_explicit(&config).is_err());
    }
}
