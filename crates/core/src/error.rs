//! Error types and exit codes for blockscope.

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// A problem in a declarative catalog, detected when the catalog is compiled.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse catalog TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Tag '{tag}': missing required field '{field}'")]
    MissingField { tag: String, field: &'static str },

    #[error("Tag '{tag}': field '{field}' must be {expected}")]
    WrongType { tag: String, field: String, expected: &'static str },

    #[error("Tag '{tag}': invalid pattern: {source}")]
    InvalidPattern {
        tag: String,
        #[source]
        source: regex::Error,
    },

    #[error("Tag '{tag}': the way '{way}' is not handled")]
    UnknownWay { tag: String, way: String },

    #[error("Tag '{tag}': unknown position '{position}' (expected up, down or default)")]
    UnknownPosition { tag: String, position: String },

    #[error("Block '{tag}': {field} references unknown block '{target}'")]
    UnknownBlockRef { tag: String, field: &'static str, target: String },

    #[error("Tag '{tag}' is declared more than once")]
    DuplicateTag { tag: String },

    #[error("Block '{tag}': open and close delimiters must be non-empty")]
    EmptyDelimiter { tag: String },

    #[error("Unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

/// Main error type for scanning operations.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("End of '{tag}' block detected at line {line} but no start found")]
    UnmatchedClosure { tag: String, line: usize },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Exit code for the CLI:
    /// - 1: I/O error
    /// - 2: catalog/configuration error
    /// - 3: unmatched block closure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io { .. } => ExitCode::from(1),
            Self::Catalog(_) => ExitCode::from(2),
            Self::UnmatchedClosure { .. } => ExitCode::from(3),
        }
    }
}

/// Result type alias for blockscope operations.
pub type Result<T> = std::result::Result<T, ScanError>;
