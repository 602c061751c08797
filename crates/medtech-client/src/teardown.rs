//! Terminal session cleanup
//!
//! When a refresh fails (or a replayed request is rejected again), every
//! request that was waiting on it reaches its terminal state at once. The
//! side effects — clearing the credential store and bouncing the user to the
//! login entry point — must happen exactly once, not once per failed
//! request. The first caller through performs them; the rest observe the
//! work as already done and no-op.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use medtech_auth::CredentialStore;

/// Navigation hook to the unauthenticated entry point.
///
/// The embedding shell decides what "navigate" means: a router replace in a
/// UI, a message to the operator in a console.
pub trait Redirect: Send + Sync {
    fn to_login(&self);
}

/// One-shot session teardown, re-armed when a new session begins.
pub struct SessionTeardown {
    store: Arc<CredentialStore>,
    redirect: Box<dyn Redirect>,
    done: AtomicBool,
}

impl SessionTeardown {
    pub fn new(store: Arc<CredentialStore>, redirect: Box<dyn Redirect>) -> Self {
        Self {
            store,
            redirect,
            done: AtomicBool::new(false),
        }
    }

    /// Clear the session and redirect. First caller wins; concurrent and
    /// later callers are no-ops until [`rearm`](Self::rearm).
    pub async fn run(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            debug!("session teardown already performed");
            return;
        }
        self.store.clear().await;
        crate::metrics::record_teardown();
        info!("session ended, returning to login");
        self.redirect.to_login();
    }

    /// Make the next terminal failure tear down again. Called when a new
    /// session is established (login, successful bootstrap).
    pub fn rearm(&self) {
        self.done.store(false, Ordering::SeqCst);
    }
}
