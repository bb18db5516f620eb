//! Authenticated request gateway
//!
//! Wraps a base `Transport` so every outgoing call carries the stored bearer
//! token. When the API answers 401 the gateway renews the access token with
//! the stored refresh token and replays the original request once; requests
//! that fail while a renewal is in flight wait for that same renewal. When
//! renewal is impossible, fails, or the replay is rejected too, the session is
//! ended: all credentials are cleared and the user is sent to the login route.
//!
//! Request lifecycle:
//! 1. Stages run: static headers, content type, bearer token
//! 2. Base transport dispatches; non-auth statuses are returned as-is
//! 3. 401 → shared renewal → replay with the new token
//! 4. 403, failed renewal, or a rejected replay → `end_session` →
//!    `Error::Unauthenticated`

pub mod error;
pub mod gateway;
pub mod metrics;
pub mod renewal;
pub mod session;
pub mod stages;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{RenewalError, Result};
pub use gateway::{AuthenticatedTransport, GatewayOptions};
pub use renewal::{Renewal, RenewalKind, Renewer};
pub use stages::BearerAuth;
pub use state::{RequestAction, RequestEvent, RequestState, handle_event};
