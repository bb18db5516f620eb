//! The seam between the request layer and whatever owns the current route.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::routes::normalize;

/// Something that owns the current location and can be redirected.
pub trait Navigator: Send + Sync {
    /// Path of the committed location, `None` before the first navigation.
    fn current_path(&self) -> Option<String>;

    /// In-app navigation. Returns the committed path, which differs from
    /// `path` when a guard redirected.
    fn push(&self, path: &str) -> Result<String>;

    /// Full reset to `path`: history and in-memory view state are dropped.
    fn reload(&self, path: &str) -> Result<String>;
}

/// How a terminal authentication failure sends the user to the login route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectStrategy {
    /// Router push; keeps history.
    #[default]
    InApp,
    /// Reset navigation state, then land on the login route.
    FullReload,
}

/// Send the navigator to `login_path` unless it is already there.
///
/// Returns whether a navigation was issued. Navigation failures are logged,
/// not returned: the caller is already on an error path and reports its own
/// error.
pub fn force_login(navigator: &dyn Navigator, login_path: &str, strategy: RedirectStrategy) -> bool {
    let login = normalize(login_path);
    if let Some(current) = navigator.current_path() {
        if normalize(&current) == login {
            debug!(path = %login, "already on login route, not redirecting");
            return false;
        }
    }

    let result = match strategy {
        RedirectStrategy::InApp => navigator.push(login_path),
        RedirectStrategy::FullReload => navigator.reload(login_path),
    };
    match result {
        Ok(committed) => {
            info!(path = %committed, ?strategy, "redirected to login");
            true
        }
        Err(e) => {
            warn!(error = %e, path = %login, "login redirect failed");
            false
        }
    }
}
