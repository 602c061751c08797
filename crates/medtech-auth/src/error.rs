//! Error types for session and auth-transport operations

/// Errors from auth endpoint calls and session persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// 401/403 from an auth endpoint: the presented credential is no good.
    #[error("credential rejected: {0}")]
    Rejected(String),

    /// Any other non-success status from an auth endpoint.
    #[error("auth endpoint error: {0}")]
    Endpoint(String),

    /// The endpoint answered 2xx but the body is unusable (bad JSON, empty
    /// access token). Never reaches the credential store.
    #[error("malformed auth response: {0}")]
    MalformedResponse(String),

    #[error("session file parse error: {0}")]
    SessionParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
