//! Raw transport to the token refresh endpoint
//!
//! `refresh_session` talks to `/auth/refresh` over a plain `reqwest::Client`,
//! outside the request pipeline. That separation is load-bearing: the refresh
//! call must never pass through the pipeline's own 401 handling or a failing
//! refresh would try to refresh itself. Login and logout do ride the pipeline
//! (it exempts `/auth/*` paths from refresh handling); only renewal needs the
//! bypass, because the pipeline invokes it mid-request.
//!
//! The refresh credential itself is out-of-band: a cookie issued at login and
//! carried by the client's cookie jar, so the call sends no body.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::constants::REFRESH_PATH;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::identity::Identity;

/// Response body shared by the login and refresh endpoints.
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub user: Identity,
}

impl SessionResponse {
    /// Convert into a storable credential, enforcing the store invariant
    /// that a token is never empty.
    pub fn into_credential(self) -> Result<Credential> {
        if self.access_token.is_empty() {
            return Err(Error::MalformedResponse(
                "response carried an empty access_token".into(),
            ));
        }
        Ok(Credential {
            access_token: self.access_token,
            identity: self.user,
        })
    }
}

/// Exchange the cookie-borne refresh credential for a new session.
///
/// The `timeout` bounds the whole call; a stalled refresh endpoint fails the
/// round instead of parking its waiters forever.
pub async fn refresh_session(
    client: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
) -> Result<SessionResponse> {
    let url = format!("{}{REFRESH_PATH}", base_url.trim_end_matches('/'));
    debug!(%url, "requesting session refresh");

    let response = client
        .post(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        // 401/403 means the refresh cookie is absent, expired or revoked
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::Rejected(format!(
                "refresh rejected ({status}): {body}"
            )));
        }

        return Err(Error::Endpoint(format!(
            "refresh returned {status}: {body}"
        )));
    }

    response
        .json::<SessionResponse>()
        .await
        .map_err(|e| Error::MalformedResponse(format!("invalid refresh response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(2);

    /// Serve the given router on an ephemeral port and return its base URL.
    async fn serve(app: axum::Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn session_response_deserializes() {
        let json = r#"{"access_token":"at_abc","user":{"id":"u-1","email":"a@clinic.example","role":"admin"}}"#;
        let session: SessionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "at_abc");
        assert_eq!(session.user.id, "u-1");
    }

    #[test]
    fn empty_token_never_becomes_a_credential() {
        let json = r#"{"access_token":"","user":{"id":"u-1","email":"a@clinic.example","role":"admin"}}"#;
        let session: SessionResponse = serde_json::from_str(json).unwrap();
        let err = session.into_credential().unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn refresh_success_returns_session() {
        let app = axum::Router::new().route(
            "/auth/refresh",
            post(|| async {
                Json(serde_json::json!({
                    "access_token": "at_new",
                    "user": {"id": "u-9", "email": "r@clinic.example", "role": "reception"}
                }))
            }),
        );
        let base_url = serve(app).await;

        let client = reqwest::Client::new();
        let session = refresh_session(&client, &base_url, TIMEOUT).await.unwrap();
        assert_eq!(session.access_token, "at_new");
        assert_eq!(session.user.email, "r@clinic.example");
    }

    #[tokio::test]
    async fn refresh_401_maps_to_rejected() {
        let app = axum::Router::new().route(
            "/auth/refresh",
            post(|| async { (StatusCode::UNAUTHORIZED, "refresh token expired") }),
        );
        let base_url = serve(app).await;

        let err = refresh_session(&reqwest::Client::new(), &base_url, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn refresh_500_maps_to_endpoint_error() {
        let app = axum::Router::new().route(
            "/auth/refresh",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base_url = serve(app).await;

        let err = refresh_session(&reqwest::Client::new(), &base_url, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Endpoint(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn refresh_bad_body_maps_to_malformed() {
        let app = axum::Router::new().route(
            "/auth/refresh",
            post(|| async { ([("content-type", "application/json")], "{\"access_token\":42}") }),
        );
        let base_url = serve(app).await;

        let err = refresh_session(&reqwest::Client::new(), &base_url, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn refresh_times_out_against_a_stalled_endpoint() {
        let app = axum::Router::new().route(
            "/auth/refresh",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        );
        let base_url = serve(app).await;

        let err = refresh_session(
            &reqwest::Client::new(),
            &base_url,
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn refresh_carries_no_bearer_header() {
        // The refresh transport authenticates with the cookie jar only; it
        // must not depend on (or send) an Authorization header.
        let app = axum::Router::new().route(
            "/auth/refresh",
            post(|headers: axum::http::HeaderMap| async move {
                assert!(headers.get("authorization").is_none());
                Json(serde_json::json!({
                    "access_token": "at_new",
                    "user": {"id": "u-1", "email": "a@clinic.example", "role": "admin"}
                }))
            }),
        );
        let base_url = serve(app).await;

        refresh_session(&reqwest::Client::new(), &base_url, TIMEOUT)
            .await
            .unwrap();
    }
}
