use std::fmt;

use crate::error::AttributesError;

/// Visibility level of stored attributes.
///
/// Each variant carries the identifying fields of its scope. Records of
/// different scopes never match each other, even when a narrower scope's
/// qualifiers happen to be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeScope {
    /// Unqualified, visible to everyone using the store.
    Global,
    Application {
        application: String,
    },
    Service {
        application: String,
        service: String,
    },
    Instance {
        application: String,
        service: String,
        instance_id: u32,
    },
}

impl AttributeScope {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Application { .. } => "application",
            Self::Service { .. } => "service",
            Self::Instance { .. } => "instance",
        }
    }

    #[must_use]
    pub fn application(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Application { application }
            | Self::Service { application, .. }
            | Self::Instance { application, .. } => Some(application),
        }
    }

    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Global | Self::Application { .. } => None,
            Self::Service { service, .. } | Self::Instance { service, .. } => Some(service),
        }
    }

    #[must_use]
    pub fn instance_id(&self) -> Option<u32> {
        match self {
            Self::Instance { instance_id, .. } => Some(*instance_id),
            _ => None,
        }
    }

    /// Checks that every qualifier of the scope is non-blank.
    ///
    /// # Errors
    /// Returns `InvalidScope` naming the first blank qualifier.
    pub fn validate(&self) -> Result<(), AttributesError> {
        let qualifiers = [("application", self.application()), ("service", self.service())];
        for (name, value) in qualifiers {
            if value.is_some_and(|v| v.trim().is_empty()) {
                return Err(AttributesError::InvalidScope(format!(
                    "{} scope requires a non-empty {name}",
                    self.kind()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for AttributeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Application { application } => write!(f, "application[{application}]"),
            Self::Service {
                application,
                service,
            } => write!(f, "service[{application}/{service}]"),
            Self::Instance {
                application,
                service,
                instance_id,
            } => write!(f, "instance[{application}/{service}#{instance_id}]"),
        }
    }
}
