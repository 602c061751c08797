//! Auth endpoint paths on the clinic API

/// Password login. `POST { email, password }` → `{ access_token, user }`.
pub const LOGIN_PATH: &str = "/auth/login";

/// Silent token renewal. `POST` with no body; the refresh credential rides
/// the transport's cookie jar. Same response shape as login.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Server-side session invalidation. Best-effort for callers.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Requests under this prefix never enter the pipeline's refresh branch.
pub const AUTH_PREFIX: &str = "/auth/";
