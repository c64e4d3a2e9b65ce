/// Errors for the provisioning module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    /// The node's network identity could not be determined. Callers decide
    /// whether to retry or mark the node unusable.
    #[error("Failed to resolve host '{host}': {reason}")]
    HostResolution { host: String, reason: String },

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Node already registered: {0}")]
    DuplicateNode(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("No free node available for group '{group}'")]
    PoolExhausted { group: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ProvisioningError {
    #[must_use]
    pub fn host_resolution(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HostResolution {
            host: host.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_host_resolution(&self) -> bool {
        matches!(self, Self::HostResolution { .. })
    }
}
