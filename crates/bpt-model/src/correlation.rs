use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Input field carrying the test correlation id
pub const TID_FIELD: &str = "tid";

/// Correlation id injected into every scenario's commands.
///
/// The application is expected to key the resulting entity by this id, which
/// lets state confirmation locate it after an asynchronous write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Generate a fresh correlation id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// As a JSON input value
    #[inline]
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::String(self.0.to_string())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
