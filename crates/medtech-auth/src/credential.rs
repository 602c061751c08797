//! In-memory session credential store
//!
//! Holds the current access token together with the identity it was issued
//! to. The pair is stored as a single value and replaced wholesale, so no
//! reader can ever observe a token without an identity or vice versa. The
//! store is pure state: it performs no I/O and none of its operations can
//! fail.
//!
//! Writers are the login, refresh and teardown paths only. Everything else
//! (route guards, the request pipeline's header attachment) just reads.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::identity::Identity;

/// The session credential: access token plus authenticated identity.
///
/// A credential only exists with both fields populated; "no credential" is
/// the store holding `None`, never a half-filled value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub identity: Identity,
}

/// Process-wide holder for the current session credential.
#[derive(Debug, Default)]
pub struct CredentialStore {
    state: RwLock<Option<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
        }
    }

    /// Current credential, if authenticated. Clones out so readers never
    /// hold the lock across their own awaits.
    pub async fn get(&self) -> Option<Credential> {
        self.state.read().await.clone()
    }

    /// Replace the stored credential. Token and identity always move
    /// together; there is no partial-update window.
    pub async fn set(&self, access_token: String, identity: Identity) {
        let mut state = self.state.write().await;
        *state = Some(Credential {
            access_token,
            identity,
        });
    }

    /// Back to the unauthenticated marker.
    pub async fn clear(&self) {
        *self.state.write().await = None;
    }

    /// Identity alone, for route guards.
    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.as_ref().map(|c| c.identity.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use std::sync::Arc;

    fn identity_for(token_suffix: &str) -> Identity {
        Identity {
            id: format!("u-{token_suffix}"),
            email: format!("{token_suffix}@clinic.example"),
            role: Role::Reception,
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn starts_unauthenticated() {
        let store = CredentialStore::new();
        assert!(store.get().await.is_none());
        assert!(!store.is_authenticated().await);
        assert!(store.identity().await.is_none());
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = CredentialStore::new();
        store.set("at_1".into(), identity_for("1")).await;

        let credential = store.get().await.unwrap();
        assert_eq!(credential.access_token, "at_1");
        assert_eq!(credential.identity.id, "u-1");
        assert!(store.is_authenticated().await);
    }

    #[tokio::test]
    async fn set_replaces_wholesale() {
        let store = CredentialStore::new();
        store.set("at_1".into(), identity_for("1")).await;
        store.set("at_2".into(), identity_for("2")).await;

        let credential = store.get().await.unwrap();
        assert_eq!(credential.access_token, "at_2");
        assert_eq!(credential.identity.id, "u-2");
    }

    #[tokio::test]
    async fn clear_resets_to_unauthenticated() {
        let store = CredentialStore::new();
        store.set("at_1".into(), identity_for("1")).await;
        store.clear().await;
        assert!(store.get().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_observe_a_mismatched_pair() {
        // Writers flip between two credentials whose token suffix matches the
        // identity id; any torn read would show a token paired with the other
        // identity.
        let store = Arc::new(CredentialStore::new());
        store.set("at_1".into(), identity_for("1")).await;

        let mut tasks = Vec::new();
        for i in 0..4u32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for n in 0..250u32 {
                    let suffix = if (i + n) % 2 == 0 { "1" } else { "2" };
                    store
                        .set(format!("at_{suffix}"), identity_for(suffix))
                        .await;
                }
            }));
        }
        for _ in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..250 {
                    if let Some(credential) = store.get().await {
                        let suffix = credential.access_token.strip_prefix("at_").unwrap();
                        assert_eq!(
                            credential.identity.id,
                            format!("u-{suffix}"),
                            "token and identity must always be replaced together"
                        );
                    }
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }
}
