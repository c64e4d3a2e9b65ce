use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use provisioning_sdk::{
    CustomNode, DEFAULT_LOGIN_PORT, HostResolver, LoginCredentials, NodeState, ProvisioningError,
    SecretString,
};

use super::host::resolve_address;

/// Fields of a cloud provider's server creation response
#[derive(Debug, Clone, Default)]
pub struct CloudNodeDetails {
    /// Provider name, e.g. `aws`
    pub provider: String,
    /// Region or other sub-scope the server lives in, e.g. `us-east-1`
    pub region: String,
    /// Server id assigned by the provider, e.g. `i-123`
    pub provider_id: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    /// Internal DNS name assigned by the provider
    pub private_dns_name: Option<String>,
    pub login_port: Option<u16>,
    pub credentials: LoginCredentials,
}

/// Node created through a cloud provider API.
///
/// The id is `<provider>:<region>:<provider_id>`, so servers with the same
/// provider id in different regions never collide.
#[derive(Debug, Clone)]
pub struct CloudNode {
    provider_id: String,
    id: String,
    node_name: String,
    group: Option<String>,
    login_port: u16,
    credentials: LoginCredentials,
    public_ip: Option<String>,
    private_ip: Option<String>,
    private_dns_name: Option<String>,
    /// Address resolution starts from, fixed at creation
    resolve_target: Option<String>,
    host_name: Option<String>,
    state: NodeState,
    created_at: DateTime<Utc>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CloudNode {
    /// # Errors
    /// Returns `InvalidNode` if the provider, region or provider id is empty.
    pub fn from_details(details: CloudNodeDetails) -> Result<Self, ProvisioningError> {
        for (field, value) in [
            ("provider", &details.provider),
            ("region", &details.region),
            ("provider_id", &details.provider_id),
        ] {
            if value.trim().is_empty() {
                return Err(ProvisioningError::InvalidNode(format!(
                    "cloud node {field} must not be empty"
                )));
            }
        }

        let id = format!(
            "{}:{}:{}",
            details.provider, details.region, details.provider_id
        );
        let private_ip = non_empty(details.private_ip);
        let private_dns_name = non_empty(details.private_dns_name);
        let resolve_target = private_ip.clone().or_else(|| private_dns_name.clone());

        Ok(Self {
            node_name: details.provider_id.clone(),
            provider_id: details.provider_id,
            id,
            group: None,
            login_port: details.login_port.unwrap_or(DEFAULT_LOGIN_PORT),
            credentials: details.credentials,
            public_ip: non_empty(details.public_ip),
            private_ip,
            private_dns_name,
            resolve_target,
            host_name: None,
            state: NodeState::Unresolved,
            created_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn private_dns_name(&self) -> Option<&str> {
        self.private_dns_name.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[async_trait]
impl CustomNode for CloudNode {
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
        let Some(target) = self.resolve_target.as_deref() else {
            tracing::warn!(node_id = %self.id, "Cloud node has no private address to resolve");
            return Err(ProvisioningError::host_resolution(
                self.id.as_str(),
                "provider returned neither a private IP nor a private DNS name",
            ));
        };

        let resolved = resolve_address(resolver, target, self.private_dns_name.as_deref())
            .await
            .inspect_err(|e| {
                tracing::warn!(node_id = %self.id, error = %e, "Failed to resolve cloud node");
            })?;

        tracing::debug!(
            node_id = %self.id,
            private_ip = %resolved.ip,
            host_name = %resolved.host_name,
            "Resolved cloud node"
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

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::infra::resolver::StaticHostResolver;

    fn details() -> CloudNodeDetails {
        CloudNodeDetails {
            provider: "aws".to_owned(),
            region: "us-east-1".to_owned(),
            provider_id: "i-123".to_owned(),
            public_ip: Some(String::new()),
            private_ip: Some("10.0.0.5".to_owned()),
            ..CloudNodeDetails::default()
        }
    }

    #[test]
    fn id_encodes_provider_and_region() {
        let node = CloudNode::from_details(details()).unwrap();
        assert_eq!(node.id(), "aws:us-east-1:i-123");
        assert_eq!(node.provider_id(), "i-123");
        assert_eq!(node.node_name(), "i-123");
        assert!(node.public_ip().is_none(), "empty public ip is treated as unset");
    }

    #[tokio::test]
    async fn created_at_is_stamped_once_at_creation() {
        let before = Utc::now();
        let mut node = CloudNode::from_details(details()).unwrap();
        let after = Utc::now();

        let created_at = node.created_at();
        assert!(before <= created_at && created_at <= after);

        let resolver =
            StaticHostResolver::new().with_host("host-123", ["10.0.0.5".parse().unwrap()]);
        node.set_group(Some("web".to_owned()));
        node.resolve(&resolver).await.unwrap();
        assert_eq!(node.created_at(), created_at);
    }

    #[test]
    fn missing_region_is_rejected() {
        let err = CloudNode::from_details(CloudNodeDetails {
            region: String::new(),
            ..details()
        })
        .unwrap_err();
        assert!(matches!(err, ProvisioningError::InvalidNode(_)));
    }

    #[tokio::test]
    async fn resolve_by_dns_name_when_private_ip_missing() {
        let resolver =
            StaticHostResolver::new().with_host("host-123", ["10.0.0.5".parse().unwrap()]);
        let mut node = CloudNode::from_details(CloudNodeDetails {
            private_ip: None,
            private_dns_name: Some("host-123".to_owned()),
            ..details()
        })
        .unwrap();

        node.resolve(&resolver).await.unwrap();

        assert_eq!(node.private_ip(), Some("10.0.0.5"));
        assert_eq!(node.host_name(), Some("host-123"));
    }

    #[tokio::test]
    async fn reverse_miss_falls_back_to_provider_dns_name() {
        let mut node = CloudNode::from_details(CloudNodeDetails {
            private_dns_name: Some("ip-10-0-0-5.ec2.internal".to_owned()),
            ..details()
        })
        .unwrap();

        node.resolve(&StaticHostResolver::new()).await.unwrap();

        assert_eq!(node.host_name(), Some("ip-10-0-0-5.ec2.internal"));
    }

    #[tokio::test]
    async fn no_private_address_is_a_resolution_error() {
        let mut node = CloudNode::from_details(CloudNodeDetails {
            private_ip: None,
            ..details()
        })
        .unwrap();

        let err = node.resolve(&StaticHostResolver::new()).await.unwrap_err();

        assert!(err.is_host_resolution());
        assert_eq!(node.state(), NodeState::Unresolved);
    }
}
