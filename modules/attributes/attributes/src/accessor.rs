//! Scoped view over an `AttributesStore`.
//!
//! There is one accessor type for every scope. What distinguishes a global
//! accessor from an instance accessor is only the template strategy it was
//! built with; all map-style operations are shared and build their store
//! query from that template plus the key.

use std::fmt;
use std::sync::Arc;

use attributes_sdk::{
    AttributeScope, AttributeTemplate, AttributeValue, AttributesError, AttributesStore,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{AttributesConfig, DEFAULT_MAX_KEY_LENGTH};

/// Produces a fresh, keyless template for the accessor's scope.
pub type TemplateStrategy = Arc<dyn Fn() -> AttributeTemplate + Send + Sync>;

/// Map-like access to the attributes of one scope.
///
/// Cheap to clone; clones share the store and the strategy.
#[derive(Clone)]
pub struct AttributesAccessor {
    store: Arc<dyn AttributesStore>,
    strategy: TemplateStrategy,
    max_key_length: usize,
}

impl fmt::Debug for AttributesAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributesAccessor")
            .field("scope", &self.scope())
            .field("max_key_length", &self.max_key_length)
            .finish_non_exhaustive()
    }
}

impl AttributesAccessor {
    /// Accessor for unqualified attributes. Never fails.
    #[must_use]
    pub fn global(store: Arc<dyn AttributesStore>) -> Self {
        Self::with_template(store, Arc::new(AttributeTemplate::global))
    }

    /// # Errors
    /// Returns `InvalidScope` if `application` is blank.
    pub fn application(
        store: Arc<dyn AttributesStore>,
        application: impl Into<String>,
    ) -> Result<Self, AttributesError> {
        Self::for_scope(
            store,
            AttributeScope::Application {
                application: application.into(),
            },
        )
    }

    /// # Errors
    /// Returns `InvalidScope` if `application` or `service` is blank.
    pub fn service(
        store: Arc<dyn AttributesStore>,
        application: impl Into<String>,
        service: impl Into<String>,
    ) -> Result<Self, AttributesError> {
        Self::for_scope(
            store,
            AttributeScope::Service {
                application: application.into(),
                service: service.into(),
            },
        )
    }

    /// # Errors
    /// Returns `InvalidScope` if `application` or `service` is blank.
    pub fn instance(
        store: Arc<dyn AttributesStore>,
        application: impl Into<String>,
        service: impl Into<String>,
        instance_id: u32,
    ) -> Result<Self, AttributesError> {
        Self::for_scope(
            store,
            AttributeScope::Instance {
                application: application.into(),
                service: service.into(),
                instance_id,
            },
        )
    }

    /// Accessor with a caller-supplied template strategy.
    ///
    /// The strategy must always return a keyless template of the same scope;
    /// the accessor fills in the key per operation.
    #[must_use]
    pub fn with_template(store: Arc<dyn AttributesStore>, strategy: TemplateStrategy) -> Self {
        Self {
            store,
            strategy,
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
        }
    }

    fn for_scope(
        store: Arc<dyn AttributesStore>,
        scope: AttributeScope,
    ) -> Result<Self, AttributesError> {
        scope.validate()?;
        Ok(Self::with_template(
            store,
            Arc::new(move || AttributeTemplate::for_scope(scope.clone())),
        ))
    }

    /// Applies key limits from the module configuration.
    #[must_use]
    pub fn with_config(mut self, config: &AttributesConfig) -> Self {
        self.max_key_length = config.max_key_length;
        self
    }

    /// Fresh keyless template for this accessor's scope.
    #[must_use]
    pub fn prepare_attribute_template(&self) -> AttributeTemplate {
        (self.strategy)()
    }

    #[must_use]
    pub fn scope(&self) -> AttributeScope {
        self.prepare_attribute_template().scope
    }

    fn keyed_template(&self, key: &str) -> Result<AttributeTemplate, AttributesError> {
        self.validate_key(key)?;
        Ok(self.prepare_attribute_template().with_key(key))
    }

    fn validate_key(&self, key: &str) -> Result<(), AttributesError> {
        if key.is_empty() {
            return Err(AttributesError::InvalidKey(
                "attribute key must not be empty".to_owned(),
            ));
        }
        let len = key.chars().count();
        if len > self.max_key_length {
            return Err(AttributesError::InvalidKey(format!(
                "attribute key is {len} characters long, limit is {}",
                self.max_key_length
            )));
        }
        Ok(())
    }

    /// Current value of `key`, `None` if it is not set.
    ///
    /// # Errors
    /// `InvalidKey` for a malformed key, `StoreUnavailable` if the store
    /// cannot be reached.
    pub async fn get(&self, key: &str) -> Result<Option<AttributeValue>, AttributesError> {
        let template = self.keyed_template(key)?;
        self.store
            .read(&template)
            .await
            .inspect_err(|e| warn!(scope = %template.scope, key, error = %e, "Attribute read failed"))
    }

    /// Reads `key` and deserializes it into `T`.
    ///
    /// # Errors
    /// As [`Self::get`], plus `Serialization` if the stored value does not
    /// fit `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, AttributesError> {
        self.get(key)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(AttributesError::from)
    }

    /// Stores `value` under `key`, returning the value it replaced.
    ///
    /// # Errors
    /// `InvalidKey` for a malformed key, `Serialization` if `value` cannot be
    /// represented, `StoreUnavailable` if the store cannot be reached.
    pub async fn put<V: Serialize>(
        &self,
        key: &str,
        value: V,
    ) -> Result<Option<AttributeValue>, AttributesError> {
        let template = self.keyed_template(key)?;
        let value = serde_json::to_value(value)?;
        let previous = self
            .store
            .write(&template, value)
            .await
            .inspect_err(|e| warn!(scope = %template.scope, key, error = %e, "Attribute write failed"))?;
        debug!(scope = %template.scope, key, replaced = previous.is_some(), "Attribute stored");
        Ok(previous)
    }

    /// Stores every entry in order. Stops at the first failure; entries
    /// written before it stay written.
    ///
    /// # Errors
    /// As [`Self::put`].
    pub async fn put_all<I, K, V>(&self, entries: I) -> Result<(), AttributesError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        for (key, value) in entries {
            self.put(key.as_ref(), value).await?;
        }
        Ok(())
    }

    /// Removes `key`, returning its value if it was set.
    ///
    /// # Errors
    /// `InvalidKey` for a malformed key, `StoreUnavailable` if the store
    /// cannot be reached.
    pub async fn remove(&self, key: &str) -> Result<Option<AttributeValue>, AttributesError> {
        let template = self.keyed_template(key)?;
        self.store
            .take(&template)
            .await
            .inspect_err(|e| warn!(scope = %template.scope, key, error = %e, "Attribute remove failed"))
    }

    /// # Errors
    /// As [`Self::get`].
    pub async fn contains_key(&self, key: &str) -> Result<bool, AttributesError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Every `(key, value)` pair of this scope, ordered by key.
    ///
    /// # Errors
    /// `StoreUnavailable` if the store cannot be reached.
    pub async fn entries(&self) -> Result<Vec<(String, AttributeValue)>, AttributesError> {
        let template = self.prepare_attribute_template();
        self.store
            .read_all(&template)
            .await
            .inspect_err(|e| warn!(scope = %template.scope, error = %e, "Attribute listing failed"))
    }

    /// # Errors
    /// `StoreUnavailable` if the store cannot be reached.
    pub async fn keys(&self) -> Result<Vec<String>, AttributesError> {
        Ok(self.entries().await?.into_iter().map(|(k, _)| k).collect())
    }

    /// # Errors
    /// `StoreUnavailable` if the store cannot be reached.
    pub async fn len(&self) -> Result<usize, AttributesError> {
        Ok(self.entries().await?.len())
    }

    /// # Errors
    /// `StoreUnavailable` if the store cannot be reached.
    pub async fn is_empty(&self) -> Result<bool, AttributesError> {
        Ok(self.len().await? == 0)
    }

    /// Removes every attribute of this scope and nothing outside it.
    ///
    /// # Errors
    /// `StoreUnavailable` if the store cannot be reached.
    pub async fn clear(&self) -> Result<usize, AttributesError> {
        let template = self.prepare_attribute_template();
        self.store
            .take_all(&template)
            .await
            .inspect_err(|e| warn!(scope = %template.scope, error = %e, "Attribute clear failed"))
    }
}
