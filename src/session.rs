//! The persisted identity bundle shared by the client and the route guard.
//!
//! Three fields are persisted: `token`, `role` and `userId`. The token is
//! the only authority signal; role and user id are advisory and are only
//! reported while a token is present.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::session_storage::{SessionStore, StoreError};

/// Storage keys for the persisted session fields
pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";
pub const USER_ID_KEY: &str = "userId";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Opaque user identifier. The backend sends it either as a number or a
/// string; both are kept in their textual form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => UserId(n.to_string()),
            Raw::Text(s) => UserId(s),
        })
    }
}

/// A snapshot of the persisted session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<UserId>,
    pub role: Option<Role>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Shared handle onto the session store.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
}

impl SessionHandle {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_arc(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The stored token, if any. An empty value counts as absent.
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// Reads the session, dropping role and user id when no token is stored.
    pub fn current(&self) -> Session {
        let Some(token) = self.token() else {
            return Session::default();
        };

        let role = self
            .store
            .get(ROLE_KEY)
            .and_then(|role| role.parse::<Role>().ok());
        let user_id = self
            .store
            .get(USER_ID_KEY)
            .filter(|id| !id.is_empty())
            .map(UserId);

        Session {
            token: Some(token),
            user_id,
            role,
        }
    }

    /// Stores a new session. If any field cannot be written, whatever was
    /// already written is removed again so no partial session is left.
    pub fn persist(&self, token: &str, user_id: &UserId, role: Role) -> Result<(), StoreError> {
        let written = self
            .store
            .set(TOKEN_KEY, token)
            .and_then(|()| self.store.set(USER_ID_KEY, user_id.as_str()))
            .and_then(|()| self.store.set(ROLE_KEY, role.as_str()));

        if let Err(err) = written {
            warn!(error = %err, "could not persist session, discarding partial write");
            if let Err(err) = self.clear() {
                warn!(error = %err, "could not discard partial session");
            }
            return Err(err);
        }

        debug!(user_id = %user_id, role = %role, "persisted session");
        Ok(())
    }

    pub fn set_role(&self, role: Role) -> Result<(), StoreError> {
        self.store.set(ROLE_KEY, role.as_str())
    }

    /// Removes all three session fields. Every field is attempted even if an
    /// earlier removal fails; the first failure is returned.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut first_error = None;
        for key in [TOKEN_KEY, ROLE_KEY, USER_ID_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!(key, error = %err, "failed to remove session field");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
