use std::path::Path;

use async_trait::async_trait;
use provisioning_sdk::{
    CustomNode, DEFAULT_LOGIN_PORT, HostResolver, LoginCredentials, NodeState, ProvisioningError,
    SecretString,
};

use super::host::resolve_address;
use crate::config::ByonNodeConfig;

/// Node of a bring-your-own-node registry: a pre-existing machine known by
/// an address that may be a host name or a literal IP.
///
/// Until resolved, both `public_ip` and `private_ip` hold the configured
/// address. Resolution replaces `private_ip` with the IP literal and sets
/// the host name.
#[derive(Debug, Clone)]
pub struct ByonNode {
    provider_id: String,
    id: String,
    address: String,
    node_name: String,
    group: Option<String>,
    login_port: u16,
    credentials: LoginCredentials,
    public_ip: Option<String>,
    private_ip: Option<String>,
    host_name: Option<String>,
    state: NodeState,
}

impl ByonNode {
    /// Prefix of every BYON node id.
    pub const ID_PREFIX: &'static str = "byon:";

    /// # Errors
    /// Returns `InvalidNode` if `address` is empty.
    pub fn new(
        address: impl Into<String>,
        credentials: LoginCredentials,
    ) -> Result<Self, ProvisioningError> {
        let address = address.into().trim().to_owned();
        if address.is_empty() {
            return Err(ProvisioningError::InvalidNode(
                "byon node address must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            provider_id: address.clone(),
            id: format!("{}{address}", Self::ID_PREFIX),
            node_name: address.clone(),
            group: None,
            login_port: DEFAULT_LOGIN_PORT,
            credentials,
            public_ip: Some(address.clone()),
            private_ip: Some(address.clone()),
            host_name: None,
            state: NodeState::Unresolved,
            address,
        })
    }

    /// Builds a node from a pool entry, using `default_login_port` when the
    /// entry has none.
    ///
    /// # Errors
    /// Returns `InvalidNode` if the entry has an empty host.
    pub fn from_config(
        config: &ByonNodeConfig,
        default_login_port: u16,
    ) -> Result<Self, ProvisioningError> {
        let mut node = Self::new(config.host.as_str(), config.credentials())?;
        node.login_port = config.login_port.unwrap_or(default_login_port);
        Ok(node)
    }

    /// The address the machine was registered with.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl CustomNode for ByonNode {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn host_name(&self) -> Option<&str> {
        self.host_name.as_deref()
    }

    fn login_port(&self) -> u16 {
        self.login_port
    }

    fn set_login_port(&mut self, login_port: u16) {
        self.login_port = login_port;
    }

    fn username(&self) -> Option<&str> {
        self.credentials.username()
    }

    fn credential(&self) -> Option<&SecretString> {
        self.credentials.credential()
    }

    fn key_file(&self) -> Option<&Path> {
        self.credentials.key_file_path()
    }

    fn public_ip(&self) -> Option<&str> {
        self.public_ip.as_deref()
    }

    fn private_ip(&self) -> Option<&str> {
        self.private_ip.as_deref()
    }

    async fn resolve(&mut self, resolver: &dyn HostResolver) -> Result<(), ProvisioningError> {
        // Always resolve the registered address so repeated calls are stable.
        let resolved = resolve_address(resolver, &self.address, None)
            .await
            .inspect_err(|e| {
                tracing::warn!(node_id = %self.id, error = %e, "Failed to resolve byon node");
            })?;

        tracing::debug!(
            node_id = %self.id,
            private_ip = %resolved.ip,
            host_name = %resolved.host_name,
            "Resolved byon node"
        );

        self.private_ip = Some(resolved.ip.to_string());
        self.host_name = Some(resolved.host_name);
        self.state = NodeState::Resolved;
        Ok(())
    }

    fn set_node_name(&mut self, node_name: String) {
        self.node_name = node_name;
    }

    fn node_name(&self) -> &str {
        &self.node_name
    }

    fn set_group(&mut self, group: Option<String>) {
        self.group = group;
    }

    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn state(&self) -> NodeState {
        self.state
    }
}
