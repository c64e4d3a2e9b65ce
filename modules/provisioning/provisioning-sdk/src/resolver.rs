use std::net::IpAddr;

use async_trait::async_trait;

use crate::error::ProvisioningError;

/// Name service used by [`CustomNode::resolve`](crate::CustomNode::resolve).
///
/// Implementations perform a single lookup and never retry; a failed lookup
/// is reported as [`ProvisioningError::HostResolution`].
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Forward lookup of a host name.
    ///
    /// # Errors
    /// Returns `HostResolution` when the name is unknown or the lookup fails.
    async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, ProvisioningError>;

    /// Reverse lookup of an address. `Ok(None)` means no name is known.
    ///
    /// # Errors
    /// Returns `HostResolution` when the lookup itself fails.
    async fn reverse_lookup(&self, ip: IpAddr) -> Result<Option<String>, ProvisioningError>;
}
