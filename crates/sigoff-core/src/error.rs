use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid signature: {0}")]
    PatternParse(String),

    #[error("Signature not found: {pattern}")]
    NoMatchFound { pattern: String },

    #[error("Signature is ambiguous: {pattern} ({count} matches)")]
    AmbiguousMatch { pattern: String, count: usize },

    #[error("Displacement at offset {offset:#x} runs past the end of the section ({len:#x} bytes)")]
    DisplacementOutOfBounds { offset: usize, len: usize },

    #[error("Resolved address {target:#x} lies below module base {module_base:#x}")]
    TargetBelowModuleBase { target: u64, module_base: u64 },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Failed to open {}: {source}", path.display())]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed offset line: {0}")]
    LineFormat(String),

    #[error("Failed to load executable image: {0}")]
    Image(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::StreamOpen { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Whether the run has to stop. Everything else is local to one line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StreamOpen { .. } | Error::Io(_))
    }
}
