//! Session state and raw auth transport for the clinic API
//!
//! This crate owns everything about *being* authenticated, none of the
//! request plumbing:
//!
//! 1. `credential::CredentialStore` holds the access token and the identity
//!    it was issued to, always as one value.
//! 2. `identity::Role` gates routes/commands on the identity in the store.
//! 3. `endpoints::refresh_session()` is the one transport path that talks to
//!    `/auth/refresh` directly, so the request pipeline can renew a token
//!    without recursing into itself.
//! 4. `session_file::SessionFile` persists the credential between runs and
//!    migrates legacy storage artifacts exactly once.

pub mod constants;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod identity;
pub mod session_file;

pub use constants::*;
pub use credential::{Credential, CredentialStore};
pub use endpoints::{SessionResponse, refresh_session};
pub use error::{Error, Result};
pub use identity::{Identity, Role};
pub use session_file::SessionFile;
