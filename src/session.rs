//! Holds the bearer token for the running application.

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};

/// A cloneable handle to the current authentication token. All clones share the same slot, so a
/// token set through one handle is seen by the `ApiClient` the next time it builds a request.
///
/// The store is memory-only. Persisting the token between runs is left to the caller.
#[derive(Clone, Default)]
pub struct SessionStore {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionStore {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session that already holds `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }

    /// Replaces the current token unconditionally.
    pub fn set_token(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }

    /// Returns the current token, or `None` when signed out.
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Removes the token.
    pub fn clear(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

// Keeps the token out of logs.
impl Debug for SessionStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_starts_empty() {
        let session = SessionStore::new();
        assert!(session.token().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_set_replaces_and_clear_removes() {
        let session = SessionStore::new();
        session.set_token("abc");
        assert_eq!(session.token().as_deref(), Some("abc"));
        session.set_token("def");
        assert_eq!(session.token().as_deref(), Some("def"));
        session.clear();
        assert!(session.token().is_none());
    }

    #[test]
    fn test_clones_share_the_token() {
        let session = SessionStore::new();
        let other = session.clone();
        other.set_token("shared");
        assert_eq!(session.token().as_deref(), Some("shared"));
    }

    #[test]
    fn test_debug_hides_token() {
        let session = SessionStore::with_token("secret-value");
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret-value"));
        assert!(printed.contains("authenticated: true"));
    }
}
