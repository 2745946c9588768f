//! Descriptor-level error types.
//!
//! Errors raised while naming definitions or loading descriptor sets from
//! disk. Registry and factory errors live in their own crates and wrap
//! these where needed.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while constructing names or loading descriptor sets.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// A name is not a valid dotted protobuf identifier path.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// JSON descriptor set could not be parsed.
    #[error("failed to parse JSON descriptor set at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// YAML descriptor set could not be parsed.
    #[error("failed to parse YAML descriptor set at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The file extension does not identify a supported document format.
    #[error("unsupported descriptor set format: {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    /// I/O error while reading a descriptor set.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Generic serde_json error (not file-specific).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic serde_yaml error (not file-specific).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for descriptor operations.
pub type DescriptorResult<T> = Result<T, DescriptorError>;
