//! In-process attribute store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use attributes_sdk::{
    AttributeScope, AttributeTemplate, AttributeValue, AttributesError, AttributesStore,
};
use dashmap::DashMap;
use tracing::{debug, warn};

type RecordKey = (AttributeScope, String);

/// `AttributesStore` over a concurrent map keyed by scope and key.
///
/// Clones of an `Arc<InMemoryAttributesStore>` share the same records. The
/// availability switch lets callers simulate an unreachable engine.
pub struct InMemoryAttributesStore {
    records: DashMap<RecordKey, AttributeValue>,
    available: AtomicBool,
}

impl std::fmt::Debug for InMemoryAttributesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAttributesStore")
            .field("records_count", &self.records.len())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for InMemoryAttributesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAttributesStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        let was = self.available.swap(available, Ordering::SeqCst);
        if was != available {
            if available {
                debug!("In-memory attribute store back online");
            } else {
                warn!("In-memory attribute store marked unavailable");
            }
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of records across all scopes
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn ensure_available(&self) -> Result<(), AttributesError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(AttributesError::store_unavailable(
                "in-memory attribute store is offline",
            ))
        }
    }
}

fn record_key(template: &AttributeTemplate) -> Result<RecordKey, AttributesError> {
    let key = template.key.as_ref().ok_or_else(|| {
        AttributesError::InvalidKey(format!(
            "template for {} scope carries no key",
            template.scope
        ))
    })?;
    Ok((template.scope.clone(), key.clone()))
}

#[async_trait]
impl AttributesStore for InMemoryAttributesStore {
    async fn read(
        &self,
        template: &AttributeTemplate,
    ) -> Result<Option<AttributeValue>, AttributesError> {
        self.ensure_available()?;
        let key = record_key(template)?;
        Ok(self.records.get(&key).map(|entry| entry.value().clone()))
    }

    async fn write(
        &self,
        template: &AttributeTemplate,
        value: AttributeValue,
    ) -> Result<Option<AttributeValue>, AttributesError> {
        self.ensure_available()?;
        let key = record_key(template)?;
        Ok(self.records.insert(key, value))
    }

    async fn take(
        &self,
        template: &AttributeTemplate,
    ) -> Result<Option<AttributeValue>, AttributesError> {
        self.ensure_available()?;
        let key = record_key(template)?;
        Ok(self.records.remove(&key).map(|(_, value)| value))
    }

    async fn read_all(
        &self,
        template: &AttributeTemplate,
    ) -> Result<Vec<(String, AttributeValue)>, AttributesError> {
        self.ensure_available()?;
        let mut matching: Vec<(String, AttributeValue)> = self
            .records
            .iter()
            .filter(|entry| {
                let (scope, key) = entry.key();
                template.matches(scope, key)
            })
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matching)
    }

    async fn take_all(&self, template: &AttributeTemplate) -> Result<usize, AttributesError> {
        self.ensure_available()?;
        let mut removed = 0usize;
        self.records.retain(|(scope, key), _| {
            let hit = template.matches(scope, key);
            if hit {
                removed += 1;
            }
            !hit
        });
        debug!(scope = %template.scope, removed, "Removed attribute records");
        Ok(removed)
    }
}
