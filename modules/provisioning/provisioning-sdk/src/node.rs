use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::ProvisioningError;
use crate::resolver::HostResolver;
use crate::secret::SecretString;

/// TCP port used for terminal connections unless a backend or the
/// configuration says otherwise.
pub const DEFAULT_LOGIN_PORT: u16 = 22;

/// Resolution state of a node.
///
/// Destruction is not represented: a destroyed node is simply dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Created by a backend, network identity not yet verified.
    Unresolved,
    /// `resolve()` succeeded at least once.
    Resolved,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => f.write_str("unresolved"),
            Self::Resolved => f.write_str("resolved"),
        }
    }
}

/// A provisioned machine, independent of the backend that created it.
///
/// Accessors never fail: values that are not known yet are returned as
/// `None`. Mutators take `&mut self`, so a node has exactly one mutator at a
/// time; callers sharing a node across tasks put it behind a lock.
#[async_trait]
pub trait CustomNode: Send + Sync + fmt::Debug {
    /// Id of the server within the naming scope it was created in. May be
    /// generated by the backend and is not globally unique.
    fn provider_id(&self) -> &str;

    /// Unique id within the account on the provider.
    ///
    /// Encodes enough context (for example the region) to avoid collisions
    /// between sub-scopes of the provider. Never changes once assigned.
    fn id(&self) -> &str;

    /// Host name, known after a successful [`resolve`](Self::resolve).
    fn host_name(&self) -> Option<&str>;

    /// Port used for terminal connections, [`DEFAULT_LOGIN_PORT`] unless set.
    fn login_port(&self) -> u16;

    fn set_login_port(&mut self, login_port: u16);

    fn username(&self) -> Option<&str>;

    /// Login password. `None` when the node authenticates with a key file.
    fn credential(&self) -> Option<&SecretString>;

    /// Private key file. `None` when the node authenticates with a password.
    fn key_file(&self) -> Option<&Path>;

    /// Address used for external communication.
    fn public_ip(&self) -> Option<&str>;

    /// Address used for internal communication. Before resolution this may
    /// hold a host name instead of a literal IP.
    fn private_ip(&self) -> Option<&str>;

    /// Resolves the node's addresses and stores the private IP and host name
    /// on the node.
    ///
    /// Calling it again after success re-validates and yields the same values
    /// as long as the name service answers the same. No retry is attempted
    /// and no timeout is applied.
    ///
    /// # Errors
    /// Returns [`ProvisioningError::HostResolution`] when the address cannot
    /// be determined. The node is left exactly as it was before the call.
    async fn resolve(&mut self, resolver: &dyn HostResolver) -> Result<(), ProvisioningError>;

    fn set_node_name(&mut self, node_name: String);

    /// User defined name of the node.
    fn node_name(&self) -> &str;

    /// Sets the node's group. `None` removes the node from any group.
    fn set_group(&mut self, group: Option<String>);

    /// Tag shared by all resources of the same logical group. Bulk lifecycle
    /// operations such as destroy are scoped to it.
    fn group(&self) -> Option<&str>;

    fn state(&self) -> NodeState;

    /// Main details of the node for short print outs.
    ///
    /// Fields that are not set render as empty strings.
    fn to_short_string(&self) -> String {
        format!(
            "[id={}, name={}, group={}, public_ip={}, private_ip={}, host={}, port={}, state={}]",
            self.id(),
            self.node_name(),
            self.group().unwrap_or_default(),
            self.public_ip().unwrap_or_default(),
            self.private_ip().unwrap_or_default(),
            self.host_name().unwrap_or_default(),
            self.login_port(),
            self.state(),
        )
    }
}
