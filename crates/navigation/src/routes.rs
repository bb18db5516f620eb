//! Static route table
//!
//! Routes are declared once at startup (from config) and never mutated.
//! Patterns are `/`-separated; a segment starting with `:` captures any
//! non-empty segment, e.g. `/users/:userId/edit`.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteMeta {
    /// Unspecified means public.
    #[serde(default)]
    pub requires_auth: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
    pub name: String,
    /// Identifier of the view rendered for this route. Opaque to navigation.
    pub view: String,
    #[serde(flatten)]
    pub meta: RouteMeta,
}

impl RouteDescriptor {
    pub fn new(path: &str, name: &str, view: &str, requires_auth: bool) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            view: view.to_string(),
            meta: RouteMeta { requires_auth },
        }
    }
}

/// A concrete path matched against a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    pub name: String,
    pub view: String,
    pub meta: RouteMeta,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// First route, in declaration order, whose pattern matches `path`.
    /// Query strings and fragments are ignored for matching.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        let normalized = normalize(path);
        self.routes.iter().find_map(|route| {
            match_pattern(&route.path, &normalized).map(|params| ResolvedRoute {
                path: normalized.clone(),
                name: route.name.clone(),
                view: route.view.clone(),
                meta: route.meta.clone(),
                params,
            })
        })
    }
}

/// Strip query/fragment and any trailing slash (except for the root).
pub(crate) fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let pattern = normalize(pattern);
    let mut expected = pattern.split('/').filter(|s| !s.is_empty());
    let mut actual = path.split('/').filter(|s| !s.is_empty());
    let mut params = BTreeMap::new();

    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return Some(params),
            (Some(p), Some(a)) => {
                if let Some(name) = p.strip_prefix(':') {
                    params.insert(name.to_string(), a.to_string());
                } else if p != a {
                    return None;
                }
            }
            _ => return None,
        }
    }
}
