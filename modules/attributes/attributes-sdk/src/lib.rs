#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Attributes SDK
//!
//! This crate provides the public contract of the attributes module:
//! - `AttributeScope` and `AttributeTemplate`, the shape of stored records
//! - `AttributesStore` trait implemented by key-value engines
//! - Error type (`AttributesError`)

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod error;
pub mod scope;
pub mod store;
pub mod template;

pub use error::AttributesError;
pub use scope::AttributeScope;
pub use store::AttributesStore;
pub use template::AttributeTemplate;

/// Value stored under an attribute key
pub type AttributeValue = serde_json::Value;
