//! In-process router
//!
//! Owns the current location and history. Every transition resolves the
//! target, runs the guard and follows its redirects (each redirect target is
//! guarded again) before committing.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::{NavigationError, Result};
use crate::guard::{GuardDecision, NavigationIntent, RouteGuard};
use crate::navigator::Navigator;
use crate::routes::{ResolvedRoute, RouteTable};

/// Guard redirects followed before giving up on a transition
pub const MAX_REDIRECTS: usize = 5;

#[derive(Default)]
struct RouterState {
    current: Option<ResolvedRoute>,
    history: Vec<String>,
}

pub struct Router {
    table: RouteTable,
    guard: RouteGuard,
    state: Mutex<RouterState>,
}

impl Router {
    pub fn new(table: RouteTable, guard: RouteGuard) -> Self {
        Self {
            table,
            guard,
            state: Mutex::new(RouterState::default()),
        }
    }

    pub fn current(&self) -> Option<ResolvedRoute> {
        self.lock().current.clone()
    }

    /// Previously committed paths, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// Navigate to `path`, following guard redirects. On error nothing is
    /// committed.
    pub fn push(&self, path: &str) -> Result<ResolvedRoute> {
        let from = self.lock().current.as_ref().map(|r| r.path.clone());
        let target = self.resolve_guarded(path, from)?;

        let mut state = self.lock();
        if let Some(previous) = state.current.take() {
            state.history.push(previous.path);
        }
        state.current = Some(target.clone());
        info!(path = %target.path, name = %target.name, "navigated");
        Ok(target)
    }

    /// Drop history and in-memory location, then navigate to `path` as if
    /// the application had just started.
    pub fn reload(&self, path: &str) -> Result<ResolvedRoute> {
        let target = self.resolve_guarded(path, None)?;

        let mut state = self.lock();
        state.history.clear();
        state.current = Some(target.clone());
        info!(path = %target.path, name = %target.name, "reloaded");
        Ok(target)
    }

    fn resolve_guarded(&self, path: &str, from: Option<String>) -> Result<ResolvedRoute> {
        let mut target = path.to_string();
        for _ in 0..=MAX_REDIRECTS {
            let to = self
                .table
                .resolve(&target)
                .ok_or_else(|| NavigationError::NotFound(target.clone()))?;
            let intent = NavigationIntent {
                to,
                from: from.clone(),
            };
            match self.guard.decide(&intent) {
                GuardDecision::Allow => return Ok(intent.to),
                GuardDecision::RedirectTo(next) => {
                    debug!(from = %intent.to.path, to = %next, "guard redirected");
                    target = next;
                }
            }
        }
        Err(NavigationError::RedirectLoop(path.to_string()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for Router {
    fn current_path(&self) -> Option<String> {
        self.lock().current.as_ref().map(|r| r.path.clone())
    }

    fn push(&self, path: &str) -> Result<String> {
        Router::push(self, path).map(|r| r.path)
    }

    fn reload(&self, path: &str) -> Result<String> {
        Router::reload(self, path).map(|r| r.path)
    }
}
