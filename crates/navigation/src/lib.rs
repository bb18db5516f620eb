//! Client-side navigation: route table, route guard and router
//!
//! The guard is a pure decision over the target route's metadata and the
//! logged-in state held in the shared credential store. The router applies
//! the guard on every transition and implements `Navigator`, the seam the
//! authenticated gateway uses to send the user back to the login route.

pub mod error;
pub mod guard;
pub mod navigator;
pub mod router;
pub mod routes;

pub use error::{NavigationError, Result};
pub use guard::{GuardConfig, GuardDecision, NavigationIntent, RouteGuard};
pub use navigator::{Navigator, RedirectStrategy, force_login};
pub use router::{MAX_REDIRECTS, Router};
pub use routes::{ResolvedRoute, RouteDescriptor, RouteMeta, RouteTable};
