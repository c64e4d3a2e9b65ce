use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use provisioning_sdk::{
    DEFAULT_LOGIN_PORT, LoginAuth, LoginCredentials, ProvisioningError, SecretString,
};
use serde::{Deserialize, Deserializer};

/// Prefix of environment variables overriding the YAML configuration,
/// e.g. `PROVISIONING_RESOLVE_TIMEOUT=10s`.
pub const ENV_PREFIX: &str = "PROVISIONING_";

/// Configuration for the provisioning module
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningConfig {
    /// Login port assigned to nodes whose backend does not specify one
    #[serde(default = "default_login_port")]
    pub default_login_port: u16,

    /// Upper bound for one node resolution run by the registry, humantime
    /// format (`"5s"`, `"500ms"`)
    #[serde(
        default = "default_resolve_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub resolve_timeout: Duration,

    /// Hosts table for `StaticHostResolver`
    #[serde(default)]
    pub static_hosts: BTreeMap<String, Vec<IpAddr>>,

    /// Machines handed out by `ByonNodePool`
    #[serde(default)]
    pub byon_nodes: Vec<ByonNodeConfig>,
}

/// One pre-existing machine of the BYON pool
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ByonNodeConfig {
    /// IP address or host name of the machine
    pub host: String,
    #[serde(default)]
    pub login_port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub key_file: Option<PathBuf>,
}

fn default_login_port() -> u16 {
    DEFAULT_LOGIN_PORT
}

fn default_resolve_timeout() -> Duration {
    Duration::from_secs(5)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            default_login_port: default_login_port(),
            resolve_timeout: default_resolve_timeout(),
            static_hosts: BTreeMap::new(),
            byon_nodes: Vec::new(),
        }
    }
}

impl ProvisioningConfig {
    /// Loads the configuration from a YAML file, then applies
    /// `PROVISIONING_*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(&figment)
            .with_context(|| format!("failed to load provisioning config from {}", path.display()))
    }

    /// Parses the configuration from a YAML document.
    ///
    /// # Errors
    /// Returns an error if the document is malformed or the configuration is
    /// invalid.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Self::from_figment(&Figment::new().merge(Yaml::string(yaml)))
    }

    fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `ProvisioningError::Config` for a zero timeout, BYON entries
    /// without a host, BYON entries that do not carry exactly one of a
    /// non-empty password or a key file, and duplicate BYON hosts (compared
    /// trimmed and case-insensitively).
    pub fn validate(&self) -> Result<(), ProvisioningError> {
        if self.resolve_timeout.is_zero() {
            return Err(ProvisioningError::Config(
                "resolve_timeout must be greater than zero".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for node in &self.byon_nodes {
            if node.host.trim().is_empty() {
                return Err(ProvisioningError::Config(
                    "byon node with empty host".to_owned(),
                ));
            }
            let has_password = node.password.as_ref().is_some_and(|p| !p.is_empty());
            let has_key_file = node
                .key_file
                .as_ref()
                .is_some_and(|k| !k.as_os_str().is_empty());
            match (has_password, has_key_file) {
                (true, true) => {
                    return Err(ProvisioningError::Config(format!(
                        "byon node '{}' sets both password and key_file",
                        node.host
                    )));
                }
                (false, false) => {
                    return Err(ProvisioningError::Config(format!(
                        "byon node '{}' needs a non-empty password or a key_file",
                        node.host
                    )));
                }
                _ => {}
            }
            if !seen.insert(node.host.trim().to_ascii_lowercase()) {
                return Err(ProvisioningError::Config(format!(
                    "duplicate byon node host '{}'",
                    node.host
                )));
            }
        }
        Ok(())
    }
}

impl ByonNodeConfig {
    #[must_use]
    pub fn credentials(&self) -> LoginCredentials {
        let password = self.password.as_ref().filter(|p| !p.is_empty());
        let auth = match (password, &self.key_file) {
            (Some(password), _) => LoginAuth::Password(password.clone()),
            (None, Some(key_file)) => LoginAuth::KeyFile(key_file.clone()),
            (None, None) => LoginAuth::None,
        };
        LoginCredentials {
            username: self.username.clone(),
            auth,
        }
    }
}
