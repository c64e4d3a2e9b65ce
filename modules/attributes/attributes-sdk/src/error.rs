//! Error types for the attributes SDK.

use thiserror::Error;

/// Errors for the attributes module.
///
/// A key that is simply not set is not an error: reads return `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributesError {
    /// The backing store cannot be reached. Not retried by the accessor.
    #[error("Attribute store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid attribute scope: {0}")]
    InvalidScope(String),

    #[error("Invalid attribute key: {0}")]
    InvalidKey(String),

    #[error("Attribute serialization failed: {0}")]
    Serialization(String),
}

impl AttributesError {
    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<serde_json::Error> for AttributesError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
