//! Path resolution and breadcrumb trails over the route table.

use serde::Serialize;

use crate::errors::RouteError;
use crate::table::{ROUTES, RouteDef, ViewId};

/// A route matched against a concrete path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: &'static RouteDef,
    params: Vec<(&'static str, String)>,
}

impl RouteMatch {
    /// The matched route.
    pub fn route(&self) -> &'static RouteDef {
        self.route
    }

    /// Route name.
    pub fn name(&self) -> &'static str {
        self.route.name
    }

    /// Value captured for `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Captured parameters in pattern order.
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Resolve the view, loading it on first use for lazy routes.
    pub fn load_view(&self) -> ViewId {
        self.route.view.resolve()
    }
}

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    /// Route name.
    pub route: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Path leading to this step.
    pub href: String,
}

/// Resolves paths against a route table.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    routes: &'static [RouteDef],
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Router over the gateway's [`ROUTES`].
    pub fn new() -> Self {
        Self { routes: &ROUTES }
    }

    /// All routes, in declaration order.
    pub fn routes(&self) -> &'static [RouteDef] {
        self.routes
    }

    /// Route called `name`.
    pub fn by_name(&self, name: &str) -> Option<&'static RouteDef> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Match `path`. A trailing slash, query string and fragment are ignored.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let segments = path_segments(path);
        self.match_segments(&segments)
    }

    /// Trail of every route matching a leading part of `path`, root
    /// excluded. Yields nothing for paths that match no route.
    pub fn breadcrumbs(&self, path: &str) -> Vec<Crumb> {
        let segments = path_segments(path);
        if self.match_segments(&segments).is_none() {
            return Vec::new();
        }
        (1..=segments.len())
            .filter_map(|len| {
                let prefix = &segments[..len];
                self.match_segments(prefix).map(|m| Crumb {
                    route: m.route.name,
                    label: m.route.breadcrumb,
                    href: format!("/{}", prefix.join("/")),
                })
            })
            .collect()
    }

    /// Build the path of route `name` from `params`.
    pub fn href(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let route = self
            .by_name(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;
        let mut out = String::new();
        for segment in route.segments() {
            out.push('/');
            match segment.strip_prefix(':') {
                Some(param) => {
                    let value = params
                        .iter()
                        .find(|(k, _)| *k == param)
                        .map(|(_, v)| *v)
                        .ok_or(RouteError::MissingParam {
                            route: route.name,
                            param,
                        })?;
                    if value.is_empty() || value.contains(['/', '?', '#']) {
                        return Err(RouteError::InvalidParam {
                            param,
                            value: value.to_string(),
                        });
                    }
                    out.push_str(value);
                }
                None => out.push_str(segment),
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    fn match_segments(&self, segments: &[&str]) -> Option<RouteMatch> {
        self.routes
            .iter()
            .find_map(|route| match_route(route, segments))
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

fn match_route(route: &'static RouteDef, segments: &[&str]) -> Option<RouteMatch> {
    let pattern: Vec<&'static str> = route.segments().collect();
    if pattern.len() != segments.len() {
        return None;
    }
    let mut params = Vec::new();
    for (expected, actual) in pattern.into_iter().zip(segments) {
        match expected.strip_prefix(':') {
            Some(name) => params.push((name, (*actual).to_string())),
            None if expected == *actual => {}
            None => return None,
        }
    }
    Some(RouteMatch { route, params })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
