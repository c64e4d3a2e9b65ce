use std::path::{Path, PathBuf};

use crate::secret::SecretString;

/// How a node authenticates remote logins.
///
/// A backend authenticates either with a password or with a private key
/// file, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginAuth {
    #[default]
    None,
    Password(SecretString),
    KeyFile(PathBuf),
}

/// Remote access material for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginCredentials {
    pub username: Option<String>,
    pub auth: LoginAuth,
}

impl LoginCredentials {
    #[must_use]
    pub fn password(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: Some(username.into()),
            auth: LoginAuth::Password(password),
        }
    }

    #[must_use]
    pub fn key_file(username: impl Into<String>, key_file: impl Into<PathBuf>) -> Self {
        Self {
            username: Some(username.into()),
            auth: LoginAuth::KeyFile(key_file.into()),
        }
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn credential(&self) -> Option<&SecretString> {
        match &self.auth {
            LoginAuth::Password(password) => Some(password),
            LoginAuth::KeyFile(_) | LoginAuth::None => None,
        }
    }

    #[must_use]
    pub fn key_file_path(&self) -> Option<&Path> {
        match &self.auth {
            LoginAuth::KeyFile(path) => Some(path.as_path()),
            LoginAuth::Password(_) | LoginAuth::None => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn password_credentials_expose_only_password() {
        let creds = LoginCredentials::password("root", SecretString::new("pw"));
        assert_eq!(creds.username(), Some("root"));
        assert_eq!(creds.credential().map(SecretString::expose), Some("pw"));
        assert!(creds.key_file_path().is_none());
    }

    #[test]
    fn key_file_credentials_expose_only_key_file() {
        let creds = LoginCredentials::key_file("ubuntu", "/keys/id_rsa");
        assert_eq!(creds.key_file_path(), Some(Path::new("/keys/id_rsa")));
        assert!(creds.credential().is_none());
    }

    #[test]
    fn default_credentials_are_empty() {
        let creds = LoginCredentials::default();
        assert!(creds.username().is_none());
        assert!(creds.credential().is_none());
        assert!(creds.key_file_path().is_none());
    }
}
