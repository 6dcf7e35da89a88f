use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write generated source to `path`, creating parent directories, or to
/// stdout when no path is given.
pub fn write_output(path: Option<&Path>, contents: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")
        }
    }
}
