use std::collections::{BTreeMap, HashSet, VecDeque};

use parking_lot::Mutex;
use provisioning_sdk::{CustomNode, ProvisioningError};

use super::byon_node::ByonNode;
use crate::config::ProvisioningConfig;

#[derive(Debug, Default)]
struct PoolState {
    free: VecDeque<String>,
    allocated: HashSet<String>,
}

/// Provisioning backend over a fixed list of pre-existing machines.
///
/// Allocation hands out a fresh copy of the configured node, tagged with the
/// requested group. Releasing consumes the node and makes the machine
/// available again; the released handle cannot be reused.
#[derive(Debug)]
pub struct ByonNodePool {
    templates: BTreeMap<String, ByonNode>,
    state: Mutex<PoolState>,
}

impl ByonNodePool {
    /// # Errors
    /// Returns `Config` if the configuration is invalid.
    pub fn from_config(config: &ProvisioningConfig) -> Result<Self, ProvisioningError> {
        config.validate()?;

        let mut nodes = Vec::with_capacity(config.byon_nodes.len());
        for entry in &config.byon_nodes {
            let node = ByonNode::from_config(entry, config.default_login_port)
                .map_err(|e| ProvisioningError::Config(e.to_string()))?;
            nodes.push(node);
        }
        Ok(Self::new(nodes))
    }

    /// Builds a pool whose machines are handed out in the given order.
    /// Later duplicates of an id are ignored.
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = ByonNode>) -> Self {
        let mut templates = BTreeMap::new();
        let mut state = PoolState::default();
        for node in nodes {
            let id = node.id().to_owned();
            if templates.contains_key(&id) {
                tracing::warn!(node_id = %id, "Ignoring duplicate byon node");
                continue;
            }
            state.free.push_back(id.clone());
            templates.insert(id, node);
        }

        tracing::info!(size = templates.len(), "Initialized byon node pool");
        Self {
            templates,
            state: Mutex::new(state),
        }
    }

    /// Takes the next free machine and tags it with `group`.
    ///
    /// # Errors
    /// Returns `PoolExhausted` when every machine is allocated.
    pub fn allocate(&self, group: &str) -> Result<ByonNode, ProvisioningError> {
        let mut state = self.state.lock();
        let mut node = state
            .free
            .pop_front()
            .and_then(|id| self.templates.get(&id).cloned())
            .ok_or_else(|| ProvisioningError::PoolExhausted {
                group: group.to_owned(),
            })?;

        node.set_group(Some(group.to_owned()));
        state.allocated.insert(node.id().to_owned());

        tracing::info!(node_id = %node.id(), group = %group, "Allocated byon node");
        Ok(node)
    }

    /// Returns a previously allocated machine to the pool.
    ///
    /// # Errors
    /// Returns `NodeNotFound` if the node was not allocated from this pool.
    #[allow(clippy::needless_pass_by_value)]
    pub fn release(&self, node: Box<dyn CustomNode>) -> Result<(), ProvisioningError> {
        let id = node.id().to_owned();
        let mut state = self.state.lock();
        if !state.allocated.remove(&id) {
            return Err(ProvisioningError::NodeNotFound(id));
        }
        state.free.push_back(id.clone());
        drop(state);

        tracing::info!(node_id = %id, "Released byon node");
        Ok(())
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn free_count(&self) -> usize {
        self.state.lock().free.len()
    }

    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.state.lock().allocated.len()
    }
}
