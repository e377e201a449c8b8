//! Identity context carried by signed requests.
//!
//! A [`Context`] names the space and environment a request targets and the
//! [`Subject`] (a user or an app) it is made on behalf of. The subject is a
//! closed union: a context never holds both a user and an app.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier.
            ///
            /// # Errors
            /// Returns [`CoreError::InvalidIdentifier`] if the value is empty or
            /// has leading or trailing whitespace.
            pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
                let id = id.into();
                if id.is_empty() || id.trim() != id {
                    return Err(CoreError::InvalidIdentifier { kind: $kind });
                }
                Ok(Self(id))
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Space (tenant) identifier.
    SpaceId,
    "space id"
);
identifier!(
    /// Environment identifier within a space.
    EnvironmentId,
    "environment id"
);
identifier!(
    /// User identifier.
    UserId,
    "user id"
);
identifier!(
    /// App identifier.
    AppId,
    "app id"
);

/// The identity a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// A user acting through an app.
    #[serde(rename = "userId")]
    User(UserId),
    /// An app acting on its own behalf.
    #[serde(rename = "appId")]
    App(AppId),
}

impl Subject {
    /// The raw subject identifier, regardless of kind.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::User(id) => id.as_str(),
            Self::App(id) => id.as_str(),
        }
    }
}

/// Space, environment and subject of a signed request.
///
/// Serializes as `{"spaceId": .., "envId": .., "userId" | "appId": ..}`.
///
/// # Examples
///
/// ```
/// use appsign_core::{Context, Subject};
///
/// let context = Context::user("sp1", "env1", "u1").unwrap();
/// assert_eq!(context.space_id.as_str(), "sp1");
/// assert!(matches!(context.subject, Subject::User(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// The space the request targets.
    pub space_id: SpaceId,
    /// The environment within the space.
    #[serde(rename = "envId")]
    pub environment_id: EnvironmentId,
    /// The user or app making the request.
    #[serde(flatten)]
    pub subject: Subject,
}

impl Context {
    /// Create a context from already-validated parts.
    #[must_use]
    pub fn new(space_id: SpaceId, environment_id: EnvironmentId, subject: Subject) -> Self {
        Self {
            space_id,
            environment_id,
            subject,
        }
    }

    /// Create a user context from raw identifiers.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidIdentifier`] if any identifier is invalid.
    pub fn user(
        space_id: impl Into<String>,
        environment_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        Ok(Self::new(
            SpaceId::new(space_id)?,
            EnvironmentId::new(environment_id)?,
            Subject::User(UserId::new(user_id)?),
        ))
    }

    /// Create an app context from raw identifiers.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidIdentifier`] if any identifier is invalid.
    pub fn app(
        space_id: impl Into<String>,
        environment_id: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        Ok(Self::new(
            SpaceId::new(space_id)?,
            EnvironmentId::new(environment_id)?,
            Subject::App(AppId::new(app_id)?),
        ))
    }
}
