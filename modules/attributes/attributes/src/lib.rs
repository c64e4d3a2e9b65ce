#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Attributes Module Implementation
//!
//! The store contract and scope types live in `attributes-sdk` and are
//! re-exported here. This crate provides `AttributesAccessor`, the single
//! accessor type for every scope, and `InMemoryAttributesStore`.

pub use attributes_sdk::{
    AttributeScope, AttributeTemplate, AttributeValue, AttributesError, AttributesStore,
};

pub mod accessor;
pub mod config;
pub mod infra;

pub use accessor::{AttributesAccessor, TemplateStrategy};
pub use config::AttributesConfig;
pub use infra::memory::InMemoryAttributesStore;
