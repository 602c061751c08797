//! Authenticated client for the clinic REST API
//!
//! The one entry point the rest of the application uses is
//! [`ApiClient::request`]: callers hand it a method, a path and an optional
//! body and get a final success or a final failure. Everything between —
//! bearer attachment, 401 detection, the single-flight token refresh, the
//! one-shot replay, the logout cascade — is invisible to them.
//!
//! Request flow:
//! 1. `pipeline::ApiClient` attaches the credential from the store and sends.
//! 2. On an authentication failure (outside `/auth/*`), it joins
//!    `refresh::RefreshCoordinator`, which guarantees at most one refresh
//!    call is in flight no matter how many requests failed at once.
//! 3. With the renewed credential the original envelope is replayed exactly
//!    once; a second rejection is terminal.
//! 4. When the refresh itself fails, `teardown::SessionTeardown` clears the
//!    session and fires the login redirect exactly once.
//!
//! The thin typed collaborators in [`api`] (patients, users, appointments,
//! records) are plain pass-throughs over `request`.

pub mod api;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod refresh;
pub mod teardown;

pub use error::{ApiError, Result};
pub use pipeline::{ApiClient, ApiResponse, ClientConfig};
pub use refresh::{RefreshCoordinator, RefreshError};
pub use teardown::{Redirect, SessionTeardown};
