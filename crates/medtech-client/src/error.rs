//! Error taxonomy for pipeline callers
//!
//! Exactly one failure class is recovered from internally: a single
//! authentication failure answered by one refresh-and-retry. Everything in
//! this enum is what survives to the caller.

/// What a caller of [`crate::ApiClient::request`] can get back.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable response at all: connect failure, timeout, protocol error.
    /// Never triggers a refresh.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status. Covers business and
    /// validation errors as well as terminal authentication failures (a 401
    /// that survived the refresh-and-retry sequence).
    #[error("api returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response arrived but its body was not what the caller expected.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Status code, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accessor_only_for_server_errors() {
        let err = ApiError::Status {
            status: 422,
            body: "validation failed".into(),
        };
        assert_eq!(err.status(), Some(422));
        assert_eq!(ApiError::Transport("timeout".into()).status(), None);
        assert_eq!(ApiError::Decode("bad json".into()).status(), None);
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = ApiError::Status {
            status: 404,
            body: "no such patient".into(),
        };
        assert_eq!(err.to_string(), "api returned 404: no such patient");
    }
}
