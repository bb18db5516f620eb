//! Fixed names shared with the backend and with other components.
//!
//! The three storage keys are the whole authentication-state contract: any
//! component can tell whether a user is logged in by looking them up.

/// Storage key for the short-lived bearer token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the token exchanged for new access tokens
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Storage key for the display name of the logged-in user
pub const USERNAME_KEY: &str = "username";

/// Token refresh endpoint. Body `{"refresh": ...}`, response `{"access": ...}`.
pub const DEFAULT_REFRESH_PATH: &str = "/api/token/refresh/";

/// Token pair endpoint. Body `{"username", "password"}`, response `{"access", "refresh"}`.
pub const DEFAULT_LOGIN_PATH: &str = "/api/token/";
