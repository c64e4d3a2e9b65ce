use std::net::IpAddr;

use async_trait::async_trait;
use provisioning_sdk::{HostResolver, ProvisioningError};

/// Resolver backed by the operating system's name service.
///
/// Reverse lookups are not available through the OS stub resolver, so
/// `reverse_lookup` always answers `Ok(None)` and callers fall back to the
/// name they already have.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostResolver;

impl SystemHostResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostResolver for SystemHostResolver {
    async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, ProvisioningError> {
        let addrs = tokio::net::lookup_host((name, 0))
            .await
            .map_err(|e| ProvisioningError::host_resolution(name, e.to_string()))?;

        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }

        if ips.is_empty() {
            return Err(ProvisioningError::host_resolution(
                name,
                "name service returned no addresses",
            ));
        }

        tracing::debug!(host = %name, addresses = ?ips, "Resolved host via system resolver");
        Ok(ips)
    }

    async fn reverse_lookup(&self, _ip: IpAddr) -> Result<Option<String>, ProvisioningError> {
        Ok(None)
    }
}
