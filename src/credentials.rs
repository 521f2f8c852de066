//! Process-wide bearer credential.
//!
//! A [`SessionContext`] is created once and cloned into every component that
//! needs the credential.  Clones share the same slot, so a 401 seen by one
//! request clears the token for all of them.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared holder for the bearer token.
///
/// Mutations happen at login, logout and on a 401 response.
#[derive(Clone, Default)]
pub struct SessionContext {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context seeded with a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let context = Self::new();
        context.set(token);
        context
    }

    /// Returns the current token, if any.
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the current token.
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    /// Removes the current token.
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns true if a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
