//! services/app/src/session.rs
//!
//! Session/token bookkeeping over the local key-value store. This is the
//! single owner of the storage keys the auth layer uses; nothing else in
//! the service touches them directly.

use std::sync::Arc;

use edudash_core::domain::{AuthTokens, UserProfile};
use edudash_core::notifications::SEEN_ASSIGNMENTS_KEY;
use edudash_core::ports::{KeyValueStore, PortResult};
use tracing::warn;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

/// Process-wide session context, initialized at application start and torn
/// down on logout. Passed explicitly (not ambient) to keep testability.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// The cached profile from the last login or `/auth/me` sync. A
    /// corrupt cached value reads as logged-out rather than an error.
    pub fn current_user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Discarding unreadable cached profile: {e}");
                None
            }
        }
    }

    pub fn save_tokens(&self, tokens: &AuthTokens) -> PortResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token)
    }

    pub fn save_user(&self, user: &UserProfile) -> PortResult<()> {
        let json = serde_json::to_string(user)
            .map_err(|e| edudash_core::ports::PortError::Unexpected(e.to_string()))?;
        self.store.set(USER_KEY, &json)
    }

    /// Drops the token pair and cached profile, keeping seen-state.
    /// Used when a refresh fails and the session is simply invalid.
    pub fn clear_credentials(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
        self.store.remove(USER_KEY);
    }

    /// Full logout: clears all local state, including the notification
    /// seen-state. This is the only path that ever shrinks the seen set.
    pub fn clear_all(&self) {
        self.clear_credentials();
        self.store.remove(SEEN_ASSIGNMENTS_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStore;
    use edudash_core::domain::UserRole;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::new()))
    }

    fn tokens() -> AuthTokens {
        AuthTokens {
            access_token: "acc".to_string(),
            refresh_token: "ref".to_string(),
        }
    }

    #[test]
    fn tokens_round_trip() {
        let session = manager();
        assert!(!session.is_authenticated());
        session.save_tokens(&tokens()).unwrap();
        assert_eq!(session.access_token().as_deref(), Some("acc"));
        assert_eq!(session.refresh_token().as_deref(), Some("ref"));
        assert!(session.is_authenticated());
    }

    #[test]
    fn profile_round_trips_and_tolerates_corruption() {
        let session = manager();
        let user = UserProfile {
            id: "u1".to_string(),
            email: "s@example.com".to_string(),
            full_name: Some("Sam".to_string()),
            role: UserRole::Student,
        };
        session.save_user(&user).unwrap();
        assert_eq!(session.current_user().unwrap().id, "u1");

        session.store().set(USER_KEY, "garbage").unwrap();
        assert!(session.current_user().is_none());
    }

    #[test]
    fn clear_credentials_keeps_seen_state() {
        let session = manager();
        session.save_tokens(&tokens()).unwrap();
        session
            .store()
            .set(SEEN_ASSIGNMENTS_KEY, r#"["a"]"#)
            .unwrap();

        session.clear_credentials();
        assert!(!session.is_authenticated());
        assert!(session.store().get(SEEN_ASSIGNMENTS_KEY).is_some());

        session.clear_all();
        assert!(session.store().get(SEEN_ASSIGNMENTS_KEY).is_none());
    }
}
