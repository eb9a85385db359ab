//! Dynamic confirmation error types

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single GraphQL exchange
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("not authorized")]
    Unauthorized,

    #[error("graphql errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("http status {status}")]
    Http { status: u16 },

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// True for errors the application itself produced, as opposed to
    /// failures reaching it
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::GraphQl(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// No client could be resolved for a role set
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no client configured for role(s) {}", .roles.join(", "))]
    NoClient { roles: Vec<String> },

    #[error("no roles to resolve")]
    NoRoles,
}

/// Failure reading persisted snapshots
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_messages_are_joined() {
        let err = TransportError::GraphQl(vec!["drink is required".into(), "bad tid".into()]);
        assert_eq!(err.to_string(), "graphql errors: drink is required; bad tid");
        assert!(err.is_rejection());
    }

    #[test]
    fn transport_failures_are_not_rejections() {
        assert!(!TransportError::Http { status: 502 }.is_rejection());
        assert!(!TransportError::Transport("connection refused".into()).is_rejection());
    }

    #[test]
    fn resolve_error_lists_roles() {
        let err = ResolveError::NoClient {
            roles: vec!["Bartender".into(), "Owner".into()],
        };
        assert_eq!(
            err.to_string(),
            "no client configured for role(s) Bartender, Owner"
        );
    }
}
