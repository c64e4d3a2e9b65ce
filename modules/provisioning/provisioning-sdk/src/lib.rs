#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Provisioning SDK
//!
//! This crate provides the public contract of the provisioning module:
//! - `CustomNode` trait implemented by every provisioning backend's node type
//! - `HostResolver` trait used by nodes to resolve their network identity
//! - Credential types (`LoginCredentials`, `LoginAuth`, `SecretString`)
//! - Error type (`ProvisioningError`)
//!
//! Orchestration code depends only on this crate and handles nodes as
//! `Box<dyn CustomNode>`, regardless of which backend created them.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod credentials;
pub mod error;
pub mod node;
pub mod resolver;
pub mod secret;

pub use credentials::{LoginAuth, LoginCredentials};
pub use error::ProvisioningError;
pub use node::{CustomNode, DEFAULT_LOGIN_PORT, NodeState};
pub use resolver::HostResolver;
pub use secret::SecretString;
