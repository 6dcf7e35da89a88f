use std::io;
use std::path::PathBuf;

/// Errors that can occur while generating mocks
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("package {pattern} not found: {reason}")]
    PackageNotFound { pattern: String, reason: String },

    #[error("{}:{line}:{column}: {message}", file.display())]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{package}: undefined: {name}")]
    Undefined { package: String, name: String },

    #[error("{package}: invalid type {name}: {reason}")]
    InvalidType {
        package: String,
        name: String,
        reason: String,
    },

    #[error("interface {0} missing")]
    MissingInterface(String),

    #[error("{name} should be an interface, was {kind}")]
    NotAnInterface { name: String, kind: String },

    #[error("cannot resolve directory of package {path}: {reason}")]
    Qualification { path: String, reason: String },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("import normalization failed: {0}")]
    Normalize(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for gomockgen operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn not_found(pattern: &str, reason: impl Into<String>) -> Self {
        Error::PackageNotFound {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
