//! Route table.
//!
//! # Responsibilities
//! - Store registered page routes
//! - Reject malformed paths and duplicate names at registration time
//! - Sort routes so more specific prefixes come first
//! - Export the `name -> entry file` map for the bundler
//!
//! # Design Decisions
//! - Routes accumulate; a later registration never replaces an earlier one
//! - Sorting is stable, so finalizing twice yields the same order
//! - Duplicate paths are allowed; the first one in table order wins

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::matcher::remove_trailing_slash;

/// A page entry point served under its own URL prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Route {
    /// URL prefix, starting with `/`.
    pub path: String,

    /// Entry module handed to the bundler.
    pub file: String,

    /// Unique logical name, also the bundler entry name.
    pub name: String,
}

impl Route {
    pub fn new(path: impl Into<String>, file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
            name: name.into(),
        }
    }
}

/// Errors raised while registering routes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// Another route already uses this name.
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),

    /// The path is not a usable URL prefix.
    #[error("invalid route path `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("route name must not be empty (path `{0}`)")]
    EmptyName(String),

    #[error("route `{0}` has no entry file")]
    EmptyFile(String),
}

/// Ordered registry of page routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a route.
    pub fn register(&mut self, route: Route) -> Result<(), RouteError> {
        validate_route(&route)?;

        if self.routes.iter().any(|r| r.name == route.name) {
            return Err(RouteError::DuplicateName(route.name));
        }

        let normalized = remove_trailing_slash(&route.path);
        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| remove_trailing_slash(&r.path) == normalized)
        {
            tracing::warn!(
                path = %route.path,
                name = %route.name,
                existing = %existing.name,
                "Route path registered twice; the first in table order wins"
            );
        }

        self.routes.push(route);
        Ok(())
    }

    /// Register several routes, stopping at the first invalid one.
    pub fn register_all(&mut self, routes: impl IntoIterator<Item = Route>) -> Result<(), RouteError> {
        for route in routes {
            self.register(route)?;
        }
        Ok(())
    }

    /// Sort descending by path so specific prefixes are installed first.
    pub fn finalize(&mut self) {
        self.routes.sort_by(|a, b| b.path.cmp(&a.path));
    }

    /// Entry points for the bundler, one per route.
    pub fn to_build_input_map(&self) -> BTreeMap<String, String> {
        self.routes
            .iter()
            .map(|r| (r.name.clone(), r.file.clone()))
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

fn validate_route(route: &Route) -> Result<(), RouteError> {
    let invalid = |reason| RouteError::InvalidPath {
        path: route.path.clone(),
        reason,
    };

    if !route.path.starts_with('/') {
        return Err(invalid("must start with `/`"));
    }
    if route.path.contains(['*', '?', '#']) {
        return Err(invalid("must not contain `*`, `?` or `#`"));
    }
    if route.path.split('/').any(|segment| segment == "..") {
        return Err(invalid("must not contain `..` segments"));
    }
    if route.name.trim().is_empty() {
        return Err(RouteError::EmptyName(route.path.clone()));
    }
    if route.file.trim().is_empty() {
        return Err(RouteError::EmptyFile(route.name.clone()));
    }
    Ok(())
}
