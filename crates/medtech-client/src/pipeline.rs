//! Authenticated request pipeline
//!
//! Wraps every outbound API call: attaches the current bearer token, detects
//! authentication failure, funnels concurrent failures into one refresh, and
//! replays the failed request exactly once with the renewed credential. When
//! the refresh itself fails — or the replayed request is rejected again —
//! the session is torn down and the original error goes back to the caller.
//!
//! Per-call state machine:
//!
//! ```text
//! attach ── send ──┬── 2xx ─────────────────────────────► success
//!                  ├── non-auth error ───────────────────► surfaced
//!                  └── 401 (non-/auth/ path, first try)
//!                        └── join refresh ──┬── ok ── replay once ──► settle
//!                                           └── failed ── teardown ─► original error
//! ```
//!
//! Calls to `/auth/*` paths skip the refresh branch entirely: a failing
//! login or refresh must surface directly, never trigger another refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use common::Secret;
use medtech_auth::constants::{AUTH_PREFIX, LOGIN_PATH, LOGOUT_PATH};
use medtech_auth::{CredentialStore, Identity, SessionResponse};

use crate::api::appointments::AppointmentsApi;
use crate::api::patients::PatientsApi;
use crate::api::records::RecordsApi;
use crate::api::users::UsersApi;
use crate::error::{ApiError, Result};
use crate::refresh::RefreshCoordinator;
use crate::teardown::{Redirect, SessionTeardown};

/// Settings for building an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-request timeout on business calls.
    pub request_timeout: Duration,
    /// Timeout on the refresh call; a stalled refresh fails the round
    /// instead of parking its waiters forever.
    pub refresh_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(30),
        }
    }
}

/// Final response handed back to callers: status plus the raw body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::Decode(format!("response body: {e}")))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn into_error(self) -> ApiError {
        ApiError::Status {
            status: self.status.as_u16(),
            body: String::from_utf8_lossy(&self.body).into_owned(),
        }
    }
}

/// Captured description of a request, sufficient to resend it verbatim once.
struct Envelope {
    method: Method,
    path: String,
    body: Option<Value>,
    headers: HeaderMap,
    /// Retry-once marker: set before the single replay.
    retried: bool,
}

impl Envelope {
    /// Auth endpoints never enter the refresh branch.
    fn is_auth_path(&self) -> bool {
        self.path.starts_with(AUTH_PREFIX)
    }
}

/// Authenticated client for the clinic API.
///
/// One instance per process. The HTTP client carries the cookie jar the
/// refresh credential lives in, and is shared with the refresh transport.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    store: Arc<CredentialStore>,
    refresher: RefreshCoordinator,
    teardown: SessionTeardown,
}

impl ApiClient {
    pub fn new(config: ClientConfig, redirect: Box<dyn Redirect>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Transport(format!("building http client: {e}")))?;

        let store = Arc::new(CredentialStore::new());
        let refresher = RefreshCoordinator::new(
            http.clone(),
            config.base_url.clone(),
            store.clone(),
            config.refresh_timeout,
        );
        let teardown = SessionTeardown::new(store.clone(), redirect);

        Ok(Self {
            http,
            base_url: config.base_url,
            timeout: config.request_timeout,
            store,
            refresher,
            teardown,
        })
    }

    /// The credential store, for route guards and session persistence.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Single entry point for every outbound call.
    ///
    /// Callers see a final success or a final failure; the refresh-and-replay
    /// mechanics never surface here.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<ApiResponse> {
        let envelope = Envelope {
            method,
            path: path.to_string(),
            body,
            headers: headers.unwrap_or_default(),
            retried: false,
        };
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        self.run(envelope, &request_id).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, method = %envelope.method, path = %envelope.path))]
    async fn run(&self, mut envelope: Envelope, request_id: &str) -> Result<ApiResponse> {
        let started = Instant::now();
        let first = self.dispatch(&envelope).await?;

        if first.status != StatusCode::UNAUTHORIZED || envelope.is_auth_path() {
            return Self::settle(first, &envelope.method, started);
        }

        debug!("authentication failure, joining token refresh");
        match self.refresher.refresh().await {
            Ok(credential) => {
                envelope.retried = true;
                let retry = self
                    .dispatch_with(&envelope, Some(&credential.access_token))
                    .await?;
                if retry.status == StatusCode::UNAUTHORIZED {
                    // The renewed token was rejected too; nothing left to try.
                    warn!("replayed request rejected again, ending session");
                    self.teardown.run().await;
                }
                Self::settle(retry, &envelope.method, started)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, ending session");
                self.teardown.run().await;
                // The caller gets the original 401-derived error, not the
                // refresh failure.
                Self::settle(first, &envelope.method, started)
            }
        }
    }

    /// Send with the credential currently in the store.
    async fn dispatch(&self, envelope: &Envelope) -> Result<ApiResponse> {
        let token = self.store.get().await.map(|c| c.access_token);
        self.dispatch_with(envelope, token.as_deref()).await
    }

    /// Send the envelope once with the given bearer token (if any).
    async fn dispatch_with(&self, envelope: &Envelope, token: Option<&str>) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), envelope.path);
        let mut headers = envelope.headers.clone();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Transport(format!("unusable bearer token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut request = self
            .http
            .request(envelope.method.clone(), &url)
            .headers(headers)
            .timeout(self.timeout);
        if let Some(body) = &envelope.body {
            request = request.json(body);
        }

        debug!(retried = envelope.retried, authenticated = token.is_some(), "dispatching");
        let response = request.send().await.map_err(|e| {
            crate::metrics::record_transport_error();
            if e.is_timeout() {
                ApiError::Transport(format!("request timed out: {e}"))
            } else {
                ApiError::Transport(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("reading response body: {e}")))?;
        Ok(ApiResponse { status, body })
    }

    /// Record the settled outcome and convert non-success into an error.
    fn settle(response: ApiResponse, method: &Method, started: Instant) -> Result<ApiResponse> {
        crate::metrics::record_request(
            response.status.as_u16(),
            method.as_str(),
            started.elapsed().as_secs_f64(),
        );
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(response.into_error())
        }
    }

    /// Authenticate with email/password and store the resulting credential.
    ///
    /// Rides the pipeline like any other call — a 401 here (bad password)
    /// surfaces directly, it never triggers a refresh.
    pub async fn login(&self, email: &str, password: &Secret<String>) -> Result<Identity> {
        let body = serde_json::json!({ "email": email, "password": password.expose() });
        let response = self.request(Method::POST, LOGIN_PATH, Some(body), None).await?;

        let session: SessionResponse = response.json()?;
        let credential = session
            .into_credential()
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        self.store
            .set(
                credential.access_token.clone(),
                credential.identity.clone(),
            )
            .await;
        self.teardown.rearm();
        info!(role = credential.identity.role.label(), "login succeeded");
        Ok(credential.identity)
    }

    /// Try one silent refresh when starting without a credential.
    ///
    /// Returns whether the client ended up authenticated. Failure leaves the
    /// client unauthenticated without a redirect; the caller simply starts
    /// at the login entry point.
    pub async fn bootstrap(&self) -> bool {
        if self.store.is_authenticated().await {
            return true;
        }
        match self.refresher.refresh().await {
            Ok(_) => {
                self.teardown.rearm();
                debug!("session restored via silent refresh");
                true
            }
            Err(err) => {
                debug!(error = %err, "silent session restore failed");
                self.store.clear().await;
                false
            }
        }
    }

    /// End the session deliberately. The server call is best-effort; the
    /// local teardown happens regardless.
    pub async fn logout(&self) {
        if let Err(err) = self.request(Method::POST, LOGOUT_PATH, None, None).await {
            debug!(error = %err, "logout endpoint call failed, tearing down anyway");
        }
        self.teardown.run().await;
    }

    pub fn patients(&self) -> PatientsApi<'_> {
        PatientsApi { client: self }
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { client: self }
    }

    pub fn appointments(&self) -> AppointmentsApi<'_> {
        AppointmentsApi { client: self }
    }

    pub fn records(&self) -> RecordsApi<'_> {
        RecordsApi { client: self }
    }
}
