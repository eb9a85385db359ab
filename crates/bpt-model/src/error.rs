//! Error types for process loading

use std::path::PathBuf;

/// Errors while reading a process description
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// File extension does not map to a known format
    #[error("unsupported process format: '{0}' (expected json, yaml or yml)")]
    UnsupportedFormat(String),

    /// Process file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON document
    #[error("invalid process json: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML document
    #[error("invalid process yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
