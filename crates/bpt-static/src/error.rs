//! Error types for artifact reading
//!
//! A missing artifact is not an error: readers return `None` and the
//! confirmation turns it into an issue. Only genuine IO failures and
//! oversized files surface here.

use std::path::PathBuf;

/// Errors while reading application source artifacts
#[derive(Debug, thiserror::Error)]
pub enum StaticError {
    /// IO error other than not-found
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact exceeds the configured size limit
    #[error("artifact too large: {path} is {size} bytes (max: {max})")]
    TooLarge { path: PathBuf, size: usize, max: usize },
}

impl StaticError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for artifact reading
pub type StaticResult<T> = Result<T, StaticError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = StaticError::io_error(
            "src/roles.ts",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "io error reading src/roles.ts: denied");
    }

    #[test]
    fn too_large_display() {
        let err = StaticError::TooLarge {
            path: "a.ts".into(),
            size: 20,
            max: 10,
        };
        assert!(err.to_string().contains("20 bytes (max: 10)"));
    }
}
