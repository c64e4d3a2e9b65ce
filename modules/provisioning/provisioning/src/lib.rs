#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Provisioning Module Implementation
//!
//! The node contract is defined in `provisioning-sdk` and re-exported here.
//! This crate provides the backend node types (`ByonNode`, `CloudNode`), the
//! host resolvers, the in-memory `NodeRegistry` used by orchestration code,
//! and the `ByonNodePool` backend over a static list of machines.

pub use provisioning_sdk::{
    CustomNode, DEFAULT_LOGIN_PORT, HostResolver, LoginAuth, LoginCredentials, NodeState,
    ProvisioningError, SecretString,
};

pub mod config;
pub mod domain;
pub mod infra;

pub use config::{ByonNodeConfig, ProvisioningConfig};
pub use domain::byon_node::ByonNode;
pub use domain::cloud_node::{CloudNode, CloudNodeDetails};
pub use domain::pool::ByonNodePool;
pub use domain::registry::NodeRegistry;
pub use infra::resolver::{StaticHostResolver, SystemHostResolver};
