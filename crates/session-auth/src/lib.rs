//! Session credentials for the authenticated request layer
//!
//! Provides the process-wide credential store (access token, refresh token,
//! username) and the two token endpoint calls. This crate knows nothing about
//! interception or navigation; it is consumed by the gateway and the route
//! guard, which share one `Arc<CredentialStore>`.
//!
//! Credential flow:
//! 1. `token::obtain_token_pair()` exchanges username/password for a token pair
//! 2. `CredentialStore::store_bundle()` persists it
//! 3. On a 401 the gateway calls `token::refresh_access_token()`
//! 4. The new access token is saved via `CredentialStore::set()`
//! 5. Logout or a failed renewal calls `CredentialStore::clear_all()`

pub mod constants;
pub mod credentials;
pub mod error;
pub mod token;

pub use constants::*;
pub use credentials::{CredentialBundle, CredentialKey, CredentialStore};
pub use error::{Error, Result};
pub use token::{RefreshResponse, TokenPair, obtain_token_pair, refresh_access_token};
