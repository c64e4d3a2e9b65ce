use crate::scope::AttributeScope;

/// Query/write template for the attribute store: a scope plus an optional
/// key. A template without a key addresses every key of its scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeTemplate {
    pub scope: AttributeScope,
    pub key: Option<String>,
}

impl AttributeTemplate {
    #[must_use]
    pub fn for_scope(scope: AttributeScope) -> Self {
        Self { scope, key: None }
    }

    #[must_use]
    pub fn global() -> Self {
        Self::for_scope(AttributeScope::Global)
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Whether a record stored under `scope`/`key` matches this template
    #[must_use]
    pub fn matches(&self, scope: &AttributeScope, key: &str) -> bool {
        self.scope == *scope && self.key.as_deref().is_none_or(|k| k == key)
    }
}
