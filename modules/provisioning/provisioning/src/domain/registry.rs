use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use provisioning_sdk::{CustomNode, HostResolver, NodeState, ProvisioningError};
use tokio::sync::Mutex;

use crate::config::ProvisioningConfig;

/// One registered node. The slot is emptied on deregistration so that tasks
/// still holding the entry observe the node as gone.
type NodeSlot = Arc<Mutex<Option<Box<dyn CustomNode>>>>;

/// In-memory owner of live nodes, keyed by node id.
///
/// Each node sits behind its own async mutex: mutations and resolutions of
/// one node are serialized, different nodes proceed independently.
pub struct NodeRegistry {
    nodes: RwLock<HashMap<String, NodeSlot>>,
    resolver: Arc<dyn HostResolver>,
    resolve_timeout: Duration,
}

impl NodeRegistry {
    #[must_use]
    pub fn new(resolver: Arc<dyn HostResolver>, resolve_timeout: Duration) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            resolver,
            resolve_timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &ProvisioningConfig, resolver: Arc<dyn HostResolver>) -> Self {
        Self::new(resolver, config.resolve_timeout)
    }

    /// Takes ownership of a created node.
    ///
    /// # Errors
    /// Returns `InvalidNode` if the node's id or provider id is empty, and
    /// `DuplicateNode` if a node with the same id is already registered.
    pub fn register(&self, node: Box<dyn CustomNode>) -> Result<(), ProvisioningError> {
        if node.id().is_empty() || node.provider_id().is_empty() {
            return Err(ProvisioningError::InvalidNode(format!(
                "node {} is missing its id or provider id",
                node.to_short_string()
            )));
        }

        let id = node.id().to_owned();
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&id) {
            return Err(ProvisioningError::DuplicateNode(id));
        }

        tracing::info!(node_id = %id, node = %node.to_short_string(), "Registered node");
        nodes.insert(id, Arc::new(Mutex::new(Some(node))));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.read().contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Registered ids in ascending order
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn slot(&self, id: &str) -> Result<NodeSlot, ProvisioningError> {
        self.nodes
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ProvisioningError::NodeNotFound(id.to_owned()))
    }

    fn slots(&self) -> Vec<(String, NodeSlot)> {
        let mut slots: Vec<(String, NodeSlot)> = self
            .nodes
            .read()
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));
        slots
    }

    /// Runs `f` with shared access to the node.
    ///
    /// # Errors
    /// Returns `NodeNotFound` if no node with this id is registered.
    pub async fn with_node<R>(
        &self,
        id: &str,
        f: impl FnOnce(&dyn CustomNode) -> R + Send,
    ) -> Result<R, ProvisioningError> {
        let slot = self.slot(id)?;
        let guard = slot.lock().await;
        let node = guard
            .as_deref()
            .ok_or_else(|| ProvisioningError::NodeNotFound(id.to_owned()))?;
        Ok(f(node))
    }

    async fn with_node_mut<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut dyn CustomNode) -> R + Send,
    ) -> Result<R, ProvisioningError> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        let node = guard
            .as_deref_mut()
            .ok_or_else(|| ProvisioningError::NodeNotFound(id.to_owned()))?;
        Ok(f(node))
    }

    /// # Errors
    /// Returns `NodeNotFound` if no node with this id is registered.
    pub async fn short_description(&self, id: &str) -> Result<String, ProvisioningError> {
        self.with_node(id, |node| node.to_short_string()).await
    }

    /// # Errors
    /// Returns `NodeNotFound` if no node with this id is registered.
    pub async fn set_group(&self, id: &str, group: Option<String>) -> Result<(), ProvisioningError> {
        self.with_node_mut(id, |node| node.set_group(group)).await
    }

    /// # Errors
    /// Returns `NodeNotFound` if no node with this id is registered.
    pub async fn set_node_name(&self, id: &str, node_name: String) -> Result<(), ProvisioningError> {
        self.with_node_mut(id, |node| node.set_node_name(node_name)).await
    }

    /// Ids of the nodes tagged with `group`, in ascending order
    pub async fn group_members(&self, group: &str) -> Vec<String> {
        let mut members = Vec::new();
        for (id, slot) in self.slots() {
            let guard = slot.lock().await;
            if guard.as_deref().and_then(|node| node.group()) == Some(group) {
                members.push(id);
            }
        }
        members
    }

    /// Resolves one node, bounded by the configured resolve timeout.
    ///
    /// A timed out resolution leaves the node unchanged.
    ///
    /// # Errors
    /// Returns `NodeNotFound` for unknown ids and `HostResolution` when the
    /// node cannot be resolved or the timeout elapses.
    pub async fn resolve(&self, id: &str) -> Result<(), ProvisioningError> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        let node = guard
            .as_deref_mut()
            .ok_or_else(|| ProvisioningError::NodeNotFound(id.to_owned()))?;

        let host = node.private_ip().unwrap_or(id).to_owned();
        match tokio::time::timeout(self.resolve_timeout, node.resolve(self.resolver.as_ref())).await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    node_id = %id,
                    timeout = %humantime::format_duration(self.resolve_timeout),
                    "Node resolution timed out"
                );
                Err(ProvisioningError::host_resolution(
                    host,
                    format!(
                        "timed out after {}",
                        humantime::format_duration(self.resolve_timeout)
                    ),
                ))
            }
        }
    }

    /// Resolves every node that is still unresolved, one after another.
    ///
    /// Failures are reported per node and do not stop the run.
    pub async fn resolve_all(&self) -> Vec<(String, Result<(), ProvisioningError>)> {
        let mut outcomes = Vec::new();
        for (id, slot) in self.slots() {
            let unresolved = slot
                .lock()
                .await
                .as_deref()
                .is_some_and(|node| node.state() == NodeState::Unresolved);
            if unresolved {
                let outcome = self.resolve(&id).await;
                outcomes.push((id, outcome));
            }
        }
        outcomes
    }

    /// Removes a node and hands it back to the caller, typically the backend
    /// that destroys it.
    ///
    /// # Errors
    /// Returns `NodeNotFound` if no node with this id is registered.
    pub async fn deregister(&self, id: &str) -> Result<Box<dyn CustomNode>, ProvisioningError> {
        let slot = self
            .nodes
            .write()
            .remove(id)
            .ok_or_else(|| ProvisioningError::NodeNotFound(id.to_owned()))?;

        let node = slot
            .lock()
            .await
            .take()
            .ok_or_else(|| ProvisioningError::NodeNotFound(id.to_owned()))?;

        tracing::info!(node_id = %id, "Deregistered node");
        Ok(node)
    }

    /// Removes every node tagged with `group`.
    pub async fn deregister_group(&self, group: &str) -> Vec<Box<dyn CustomNode>> {
        let mut removed = Vec::new();
        for id in self.group_members(group).await {
            // A concurrent deregistration may have won the race.
            if let Ok(node) = self.deregister(&id).await {
                removed.push(node);
            }
        }
        tracing::info!(group = %group, count = removed.len(), "Deregistered node group");
        removed
    }
}
