//! Single-flight token renewal
//!
//! Any number of requests can discover an expired token in the same
//! scheduling window; exactly one network call to `/auth/refresh` may result.
//! The first caller to arrive becomes the leader and performs the call; every
//! caller that arrives while it is outstanding is parked on a oneshot channel
//! and woken with a clone of the same outcome, in arrival order.
//!
//! The leader writes the new credential to the store *before* any waiter is
//! released, so a woken waiter re-reading the store always sees the token it
//! was woken for — never one from a refresh that started after it joined.
//!
//! A rejected round is terminal: the coordinator never retries the refresh
//! call itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

use medtech_auth::{Credential, CredentialStore, endpoints};

/// Why a refresh round failed. Clonable because one outcome fans out to
/// every parked waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefreshError {
    /// The refresh credential was rejected (401/403), or the endpoint
    /// answered with an unusable session.
    #[error("refresh rejected: {0}")]
    Rejected(String),

    /// Network failure, timeout, or a non-auth error status.
    #[error("refresh transport failure: {0}")]
    Transport(String),

    /// The outstanding refresh went away without settling this waiter.
    #[error("refresh abandoned before completion")]
    Lapsed,
}

type Outcome = std::result::Result<Credential, RefreshError>;

/// Coordinates token renewal so that at most one refresh call is in flight.
///
/// The whole single-flight state lives behind one lock: `None` means idle,
/// `Some(waiters)` means a refresh is outstanding and these callers wait on
/// it. Nothing outside this type can touch either.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    store: Arc<CredentialStore>,
    waiters: Mutex<Option<Vec<oneshot::Sender<Outcome>>>>,
}

impl RefreshCoordinator {
    /// `http` must be the same cookie-jar-equipped client the pipeline uses;
    /// the refresh credential lives in that jar.
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        store: Arc<CredentialStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url,
            timeout,
            store,
            waiters: Mutex::new(None),
        }
    }

    /// Obtain a fresh credential, sharing any refresh already under way.
    pub async fn refresh(&self) -> Outcome {
        let rx = {
            let mut waiters = self.waiters.lock().await;
            match waiters.as_mut() {
                Some(queue) => {
                    let (tx, rx) = oneshot::channel();
                    queue.push(tx);
                    Some(rx)
                }
                None => {
                    *waiters = Some(Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = rx {
            debug!("joining outstanding token refresh");
            crate::metrics::record_refresh("joined");
            return rx.await.unwrap_or(Err(RefreshError::Lapsed));
        }

        let outcome = self.perform().await;

        // Drain and clear atomically: callers arriving after this lock see
        // an idle coordinator and start a new round.
        let parked = {
            let mut waiters = self.waiters.lock().await;
            waiters.take().unwrap_or_default()
        };
        if !parked.is_empty() {
            debug!(waiters = parked.len(), "releasing refresh waiters");
        }
        for tx in parked {
            let _ = tx.send(outcome.clone());
        }
        outcome
    }

    /// The one network call of a round, via the pipeline-bypassing transport.
    async fn perform(&self) -> Outcome {
        match endpoints::refresh_session(&self.http, &self.base_url, self.timeout).await {
            Ok(session) => match session.into_credential() {
                Ok(credential) => {
                    self.store
                        .set(
                            credential.access_token.clone(),
                            credential.identity.clone(),
                        )
                        .await;
                    info!(role = credential.identity.role.label(), "access token refreshed");
                    crate::metrics::record_refresh("ok");
                    Ok(credential)
                }
                Err(err) => {
                    warn!(error = %err, "refresh returned an unusable session");
                    crate::metrics::record_refresh("malformed");
                    Err(RefreshError::Rejected(err.to_string()))
                }
            },
            Err(medtech_auth::Error::Rejected(msg)) => {
                warn!(error = %msg, "refresh credential rejected");
                crate::metrics::record_refresh("rejected");
                Err(RefreshError::Rejected(msg))
            }
            Err(err) => {
                warn!(error = %err, "refresh call failed");
                crate::metrics::record_refresh("error");
                Err(RefreshError::Transport(err.to_string()))
            }
        }
    }
}
