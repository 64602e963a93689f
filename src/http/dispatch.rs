//! Ordered request dispatch.
//!
//! # Responsibilities
//! - Hold page handlers in explicit precedence groups
//! - Evaluate handlers in order until one responds
//! - Fall back to a plain 404 when every handler passes
//!
//! # Design Decisions
//! - Groups are evaluated `PreStatic` → `Routes` → `Fallback`; within a group,
//!   install order decides. No handler list is ever spliced by index
//! - A handler never errors: it either responds or hands over to the next
//! - The stack is frozen once the server is built

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;

use crate::observability::metrics;
use crate::routing::{is_under_route, path_matches_route};

/// Result of offering a request to one handler.
#[derive(Debug)]
pub enum Outcome {
    /// The handler answered the request.
    Respond(Response),
    /// The handler declined; try the next one.
    Next,
}

impl Outcome {
    pub fn respond(response: impl IntoResponse) -> Self {
        Outcome::Respond(response.into_response())
    }

    pub fn is_next(&self) -> bool {
        matches!(self, Outcome::Next)
    }
}

/// A request handler that may decline.
pub trait PageHandler: Send + Sync {
    /// Short label for logs and metrics.
    fn name(&self) -> &'static str;

    fn handle<'a>(&'a self, request: &'a Parts) -> BoxFuture<'a, Outcome>;
}

/// Precedence group. Earlier groups win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Group {
    /// Static-asset interception, ahead of every page route.
    PreStatic,
    /// One handler per registered route, most specific first.
    Routes,
    /// Host-supplied handlers, e.g. a custom not-found page.
    Fallback,
}

/// Which request paths a handler is offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
    /// Every path.
    Any,
    /// The route path itself, with or without trailing slash.
    Exact(String),
    /// The route path and everything below it.
    Route(String),
}

impl Mount {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Mount::Any => true,
            Mount::Exact(route) => path_matches_route(path, route),
            Mount::Route(route) => is_under_route(path, route),
        }
    }
}

impl std::fmt::Display for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mount::Any => f.write_str("*"),
            Mount::Exact(path) => f.write_str(path),
            Mount::Route(path) => write!(f, "{}*", crate::routing::add_trailing_slash(path)),
        }
    }
}

#[derive(Clone)]
struct Entry {
    group: Group,
    mount: Mount,
    handler: Arc<dyn PageHandler>,
}

/// Handlers in evaluation order.
#[derive(Clone, Default)]
pub struct HandlerStack {
    entries: Vec<Entry>,
}

impl HandlerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler at the end of its group.
    pub fn install(&mut self, group: Group, mount: Mount, handler: Arc<dyn PageHandler>) {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.group > group)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, Entry { group, mount, handler });
    }

    /// `(group, mount, handler name)` in evaluation order.
    pub fn describe(&self) -> Vec<(Group, Mount, &'static str)> {
        self.entries
            .iter()
            .map(|e| (e.group, e.mount.clone(), e.handler.name()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offer the request to each matching handler until one responds.
    pub async fn dispatch(&self, request: &Parts) -> Response {
        let path = request.uri.path();
        let request_id = request
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        for entry in self.entries.iter().filter(|e| e.mount.matches(path)) {
            match entry.handler.handle(request).await {
                Outcome::Respond(response) => {
                    tracing::debug!(
                        request_id = %request_id,
                        path = %path,
                        handler = entry.handler.name(),
                        mount = %entry.mount,
                        status = %response.status(),
                        "Request handled"
                    );
                    metrics::record_dispatch(entry.handler.name(), "respond");
                    return response;
                }
                Outcome::Next => {
                    metrics::record_dispatch(entry.handler.name(), "next");
                }
            }
        }

        tracing::debug!(request_id = %request_id, path = %path, "No handler responded");
        metrics::record_dispatch("none", "not_found");
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}

/// Axum fallback that runs the handler stack.
pub async fn dispatch_handler(
    State(stack): State<Arc<HandlerStack>>,
    request: Request<Body>,
) -> Response {
    let (parts, _body) = request.into_parts();
    stack.dispatch(&parts).await
}
