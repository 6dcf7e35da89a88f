//! Import normalization through an external formatter
//!
//! Rendered templates are piped through a command such as `goimports`,
//! which adds missing imports, drops unused ones and formats the file.

use crate::error::{Error, Result};
use crate::generator::Normalizer;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Runs a formatter with the source on stdin and reads the result from
/// stdout. Arguments may use `{dir}`, `{file_name}` and `{file_path}`,
/// which refer to the file the output is meant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::goimports()
    }
}

impl Formatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// `goimports -srcdir {dir}`, resolving imports as if the file lived
    /// next to its output path.
    pub fn goimports() -> Self {
        Self::new("goimports", vec!["-srcdir".to_string(), "{dir}".to_string()])
    }

    /// Build from a command line split into program and arguments.
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        match command.split_first() {
            Some((program, args)) if !program.is_empty() => {
                Ok(Self::new(program.clone(), args.to_vec()))
            }
            _ => Err(Error::ConfigError("formatter command is empty".to_string())),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders filled in for `file_name`.
    pub fn expand_args(&self, file_name: &Path) -> Vec<String> {
        let file_path = match &self.working_dir {
            Some(dir) if file_name.is_relative() => dir.join(file_name),
            _ => file_name.to_path_buf(),
        };
        let dir = file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".to_string());
        let name = file_name
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{file_path}", &file_path.display().to_string())
                    .replace("{file_name}", &name)
                    .replace("{dir}", &dir)
            })
            .collect()
    }
}

impl Normalizer for Formatter {
    fn normalize(&self, file_name: &Path, src: &[u8]) -> Result<Vec<u8>> {
        let args = self.expand_args(file_name);
        debug!("Running formatter: {} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| Error::Normalize(format!("failed to run {}: {e}", self.program)))?;

        // Feed stdin from another thread so a chatty formatter can't block
        // on a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let src = src.to_vec();
            thread::spawn(move || stdin.write_all(&src))
        });

        let output = child.wait_with_output()?;
        let written = writer.map(|w| w.join());

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::Normalize(if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            }));
        }

        match written {
            Some(Err(_)) => Err(Error::Normalize(format!(
                "failed to write source to {}",
                self.program
            ))),
            // The formatter may legitimately stop reading early.
            Some(Ok(Err(e))) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e.into()),
            _ => Ok(output.stdout),
        }
    }
}

/// Leaves the rendered source untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unformatted;

impl Normalizer for Unformatted {
    fn normalize(&self, _file_name: &Path, src: &[u8]) -> Result<Vec<u8>> {
        Ok(src.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Formatter {
        Formatter::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_expand_placeholders() {
        let formatter = Formatter::new(
            "fmt",
            vec![
                "-srcdir".to_string(),
                "{dir}".to_string(),
                "--name={file_name}".to_string(),
                "{file_path}".to_string(),
            ],
        )
        .with_working_dir("/work");

        assert_eq!(
            formatter.expand_args(Path::new("mocks/mock_gen.go")),
            vec![
                "-srcdir",
                "/work/mocks",
                "--name=mock_gen.go",
                "/work/mocks/mock_gen.go"
            ]
        );
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let formatter = Formatter::goimports();
        assert_eq!(
            formatter.expand_args(Path::new("mock_gen.go")),
            vec!["-srcdir", "."]
        );
    }

    #[test]
    fn test_from_command_line() {
        let formatter =
            Formatter::from_command_line(&["gofmt".to_string(), "-s".to_string()]).unwrap();
        assert_eq!(formatter.program(), "gofmt");
        assert!(Formatter::from_command_line(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_pipes_source_through_command() {
        let out = sh("tr a-z A-Z")
            .normalize(Path::new("x.go"), b"package a\n")
            .unwrap();
        assert_eq!(out, b"PACKAGE A\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_reports_stderr() {
        let err = sh("echo '1:1: expected package' >&2; exit 2")
            .normalize(Path::new("x.go"), b"nonsense")
            .unwrap_err();
        assert_eq!(err.to_string(), "import normalization failed: 1:1: expected package");
    }

    #[test]
    fn test_missing_program() {
        let err = Formatter::new("gomockgen-no-such-formatter", Vec::new())
            .normalize(Path::new("x.go"), b"package a\n")
            .unwrap_err();
        assert!(matches!(err, Error::Normalize(_)));
    }

    #[test]
    fn test_unformatted_is_identity() {
        assert_eq!(
            Unformatted.normalize(Path::new("x.go"), b"package a").unwrap(),
            b"package a"
        );
    }
}
