use std::collections::BTreeMap;
use std::net::IpAddr;

use async_trait::async_trait;
use provisioning_sdk::{HostResolver, ProvisioningError};

use crate::config::ProvisioningConfig;

/// Hosts-table resolver.
///
/// Names are matched case-insensitively, a trailing dot is ignored. Reverse
/// lookups return the first name (in name order) that lists the address.
#[derive(Debug, Clone, Default)]
pub struct StaticHostResolver {
    hosts: BTreeMap<String, Vec<IpAddr>>,
}

fn normalize(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

impl StaticHostResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        config
            .static_hosts
            .iter()
            .fold(Self::new(), |resolver, (name, ips)| {
                resolver.with_host(name, ips.iter().copied())
            })
    }

    #[must_use]
    pub fn with_host(
        mut self,
        name: impl AsRef<str>,
        ips: impl IntoIterator<Item = IpAddr>,
    ) -> Self {
        self.hosts
            .insert(normalize(name.as_ref()), ips.into_iter().collect());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[async_trait]
impl HostResolver for StaticHostResolver {
    async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, ProvisioningError> {
        self.hosts
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| ProvisioningError::host_resolution(name, "not in static hosts table"))
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Result<Option<String>, ProvisioningError> {
        Ok(self
            .hosts
            .iter()
            .find(|(_, ips)| ips.contains(&ip))
            .map(|(name, _)| name.clone()))
    }
}
