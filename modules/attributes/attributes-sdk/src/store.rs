//! `AttributesStore` trait definition.
//!
//! The store is the shared key-value engine behind every accessor. It is
//! addressed exclusively through templates; scope-specific key construction
//! lives in the templates, not in the store.

use async_trait::async_trait;

use crate::AttributeValue;
use crate::error::AttributesError;
use crate::template::AttributeTemplate;

/// Shared key-value engine backing the attribute accessors.
///
/// Every method reports an unreachable engine as
/// [`AttributesError::StoreUnavailable`]; a missing key is `Ok(None)`.
/// Concurrent writes to the same scope and key are last-writer-wins.
#[async_trait]
pub trait AttributesStore: Send + Sync {
    /// Reads the value matching a keyed template.
    ///
    /// # Errors
    /// `StoreUnavailable` if the engine cannot be reached, `InvalidKey` if
    /// the template carries no key.
    async fn read(
        &self,
        template: &AttributeTemplate,
    ) -> Result<Option<AttributeValue>, AttributesError>;

    /// Writes the value for a keyed template and returns the previous one.
    ///
    /// # Errors
    /// As [`AttributesStore::read`].
    async fn write(
        &self,
        template: &AttributeTemplate,
        value: AttributeValue,
    ) -> Result<Option<AttributeValue>, AttributesError>;

    /// Removes the value for a keyed template and returns it.
    ///
    /// # Errors
    /// As [`AttributesStore::read`].
    async fn take(
        &self,
        template: &AttributeTemplate,
    ) -> Result<Option<AttributeValue>, AttributesError>;

    /// All `(key, value)` pairs matching the template, ordered by key.
    ///
    /// # Errors
    /// `StoreUnavailable` if the engine cannot be reached.
    async fn read_all(
        &self,
        template: &AttributeTemplate,
    ) -> Result<Vec<(String, AttributeValue)>, AttributesError>;

    /// Removes every record matching the template, returning how many were
    /// removed.
    ///
    /// # Errors
    /// `StoreUnavailable` if the engine cannot be reached.
    async fn take_all(&self, template: &AttributeTemplate) -> Result<usize, AttributesError>;
}
