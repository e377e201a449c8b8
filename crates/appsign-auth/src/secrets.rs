//! Secret provider trait and implementations.
//!
//! Secrets are owned by the calling application. The [`SecretProvider`] trait
//! is the seam through which a verifier asks for the secret belonging to the
//! subject a request claims to come from. [`StaticSecretProvider`] is an
//! in-memory implementation for tests and small deployments.

use std::collections::HashMap;

use appsign_core::Subject;

use crate::error::AuthError;
use crate::request::Secret;

/// Trait for looking up signing secrets by subject.
///
/// Implementations may back this with a database, a secret manager or
/// configuration. Storage and rotation are the implementation's concern.
pub trait SecretProvider: Send + Sync {
    /// Retrieve the secret for the given user or app.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownSubject`] if no secret is registered.
    fn get_secret(&self, subject: &Subject) -> Result<Secret, AuthError>;
}

/// A simple in-memory secret provider backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use appsign_auth::{Secret, SecretProvider, StaticSecretProvider};
/// use appsign_core::{AppId, Subject};
///
/// let app = Subject::App(AppId::new("app1").unwrap());
/// let provider = StaticSecretProvider::new([(app.clone(), Secret::new("k".repeat(64)).unwrap())]);
/// assert!(provider.get_secret(&app).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSecretProvider {
    secrets: HashMap<Subject, Secret>,
}

impl StaticSecretProvider {
    /// Create a provider from `(subject, secret)` pairs.
    pub fn new(secrets: impl IntoIterator<Item = (Subject, Secret)>) -> Self {
        Self {
            secrets: secrets.into_iter().collect(),
        }
    }
}

impl SecretProvider for StaticSecretProvider {
    fn get_secret(&self, subject: &Subject) -> Result<Secret, AuthError> {
        self.secrets
            .get(subject)
            .cloned()
            .ok_or_else(|| AuthError::UnknownSubject(subject.id().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use appsign_core::{AppId, UserId};

    use super::*;

    #[test]
    fn test_should_return_secret_for_known_subject() {
        let user = Subject::User(UserId::new("u1").unwrap());
        let secret = Secret::new("s".repeat(64)).unwrap();
        let provider = StaticSecretProvider::new([(user.clone(), secret.clone())]);

        assert_eq!(provider.get_secret(&user).unwrap(), secret);
    }

    #[test]
    fn test_should_distinguish_user_and_app_with_same_id() {
        let user = Subject::User(UserId::new("same").unwrap());
        let app = Subject::App(AppId::new("same").unwrap());
        let provider = StaticSecretProvider::new([(user, Secret::new("s".repeat(64)).unwrap())]);

        assert!(matches!(
            provider.get_secret(&app),
            Err(AuthError::UnknownSubject(id)) if id == "same"
        ));
    }
}
