//! Development-mode handlers backed by the bundler's dev origin.
//!
//! # Responsibilities
//! - Redirect static asset requests to the dev origin once it confirms them
//! - Proxy page requests and rewrite reload-client references in the HTML
//! - Never surface dev-origin failures to the client
//!
//! # Design Decisions
//! - Fail open: network errors, timeouts and unreadable bodies fall through
//!   to the next handler instead of producing a 502
//! - No retries; one attempt per request, bounded by the fetch timeout
//! - Assets are fetched only to confirm they exist; the browser then loads
//!   them from the dev origin directly

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, request::Parts, HeaderValue, Method, StatusCode, Uri};
use futures_util::future::BoxFuture;
use regex::{Captures, Regex};
use url::Url;

use crate::config::RuntimeConfig;
use crate::http::dispatch::{Outcome, PageHandler};
use crate::http::server::ServerError;
use crate::observability::metrics;
use crate::routing::{is_static_asset_path, Route};

/// Client for the bundler's dev server.
#[derive(Debug, Clone)]
pub struct DevOrigin {
    base: String,
    client: reqwest::Client,
}

impl DevOrigin {
    pub fn new(config: &RuntimeConfig) -> Result<Self, ServerError> {
        let origin: Url = config.dev_origin().parse()?;
        if origin.cannot_be_a_base() || origin.host_str().is_none() {
            return Err(ServerError::Origin(url::ParseError::EmptyHost));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.dev.fetch_timeout_ms))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .no_proxy()
            .build()?;

        Ok(Self {
            base: origin.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Dev-origin base URL, without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Target URL for a request: base + path (+ query).
    pub fn url_for(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}{}", self.base, path_and_query)
    }

    /// Body-less GET against the dev origin.
    pub async fn fetch(&self, uri: &Uri) -> Result<reqwest::Response, reqwest::Error> {
        self.client.get(self.url_for(uri)).send().await
    }
}

fn failure_kind(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else {
        "request"
    }
}

/// Rewrites relative reload-client references to absolute dev-origin URLs.
#[derive(Debug, Clone)]
pub struct ReloadClientRewriter {
    pattern: Option<Regex>,
    origin: String,
}

impl ReloadClientRewriter {
    pub fn new<S: AsRef<str>>(origin: impl Into<String>, markers: &[S]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = markers
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&alternatives.join("|"))?)
        };

        Ok(Self {
            pattern,
            origin: origin.into(),
        })
    }

    /// Prefix every marker occurrence with the dev-origin base URL.
    pub fn rewrite(&self, html: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(html, |caps: &Captures| format!("{}{}", self.origin, &caps[0]))
                .into_owned(),
            None => html.to_string(),
        }
    }
}

/// Catch-all interceptor for static-asset-looking paths.
///
/// On a successful fetch the client is redirected to the dev origin's
/// resolved URL; anything else falls through.
pub struct AssetRedirectHandler {
    origin: DevOrigin,
}

impl AssetRedirectHandler {
    pub fn new(origin: DevOrigin) -> Self {
        Self { origin }
    }
}

impl PageHandler for AssetRedirectHandler {
    fn name(&self) -> &'static str {
        "dev-assets"
    }

    fn handle<'a>(&'a self, request: &'a Parts) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            if !is_static_asset_path(request.uri.path()) {
                return Outcome::Next;
            }

            let response = match self.origin.fetch(&request.uri).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(path = %request.uri.path(), error = %e, "Dev origin asset fetch failed");
                    metrics::record_upstream_failure(failure_kind(&e));
                    return Outcome::Next;
                }
            };

            if !response.status().is_success() {
                tracing::debug!(
                    path = %request.uri.path(),
                    status = %response.status(),
                    "Dev origin has no such asset"
                );
                return Outcome::Next;
            }

            match HeaderValue::from_str(response.url().as_str()) {
                Ok(location) => Outcome::respond((StatusCode::FOUND, [(header::LOCATION, location)])),
                Err(_) => Outcome::Next,
            }
        })
    }
}

/// Proxies one page route to the dev origin.
///
/// Only GET and HEAD are proxied; other methods fall through.
pub struct DevPageHandler {
    origin: DevOrigin,
    route: Route,
    rewriter: Arc<ReloadClientRewriter>,
    redirect_trailing_slash: bool,
}

impl DevPageHandler {
    pub fn new(
        origin: DevOrigin,
        route: Route,
        rewriter: Arc<ReloadClientRewriter>,
        redirect_trailing_slash: bool,
    ) -> Self {
        Self {
            origin,
            route,
            rewriter,
            redirect_trailing_slash,
        }
    }

    fn slash_redirect(uri: &Uri) -> Option<Outcome> {
        let mut target = format!("{}/", uri.path());
        if let Some(query) = uri.query() {
            target.push('?');
            target.push_str(query);
        }
        let location = HeaderValue::from_str(&target).ok()?;
        Some(Outcome::respond((StatusCode::FOUND, [(header::LOCATION, location)])))
    }
}

impl PageHandler for DevPageHandler {
    fn name(&self) -> &'static str {
        "dev-page"
    }

    fn handle<'a>(&'a self, request: &'a Parts) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            if request.method != Method::GET && request.method != Method::HEAD {
                return Outcome::Next;
            }

            let path = request.uri.path();
            if is_static_asset_path(path) {
                return Outcome::Next;
            }

            if self.redirect_trailing_slash && !path.ends_with('/') {
                if let Some(redirect) = Self::slash_redirect(&request.uri) {
                    return redirect;
                }
            }

            let response = match self.origin.fetch(&request.uri).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        route = %self.route.name,
                        path = %path,
                        error = %e,
                        "Dev origin unreachable, falling through"
                    );
                    metrics::record_upstream_failure(failure_kind(&e));
                    return Outcome::Next;
                }
            };

            let status = response.status();
            let html = match response.text().await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(route = %self.route.name, path = %path, error = %e, "Failed to read dev origin body");
                    metrics::record_upstream_failure(failure_kind(&e));
                    return Outcome::Next;
                }
            };

            Outcome::respond((
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
                self.rewriter.rewrite(&html),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> ReloadClientRewriter {
        ReloadClientRewriter::new("http://localhost:3001", &["/@react-refresh", "/@vite/client"]).unwrap()
    }

    #[test]
    fn test_rewrites_reload_client_references() {
        let html = r#"<script type="module">import RefreshRuntime from "/@react-refresh"</script>
<script type="module" src="/@vite/client"></script>"#;
        let out = rewriter().rewrite(html);
        assert!(out.contains(r#"from "http://localhost:3001/@react-refresh""#));
        assert!(out.contains(r#"src="http://localhost:3001/@vite/client""#));
    }

    #[test]
    fn test_rewrites_every_occurrence_once() {
        let out = rewriter().rewrite("/@vite/client /@vite/client");
        assert_eq!(out, "http://localhost:3001/@vite/client http://localhost:3001/@vite/client");
    }

    #[test]
    fn test_leaves_other_content_alone() {
        let html = r#"<script src="/src/main.tsx"></script><a href="/@vite">x</a>"#;
        assert_eq!(rewriter().rewrite(html), html);
    }

    #[test]
    fn test_origin_with_regex_metacharacters() {
        let rw = ReloadClientRewriter::new("http://$1.local:3001", &["/@vite/client"]).unwrap();
        assert_eq!(rw.rewrite("/@vite/client"), "http://$1.local:3001/@vite/client");
    }

    #[test]
    fn test_no_markers_is_identity() {
        let rw = ReloadClientRewriter::new("http://localhost:3001", &[] as &[&str]).unwrap();
        assert_eq!(rw.rewrite("/@vite/client"), "/@vite/client");
    }

    #[test]
    fn test_url_for_keeps_query() {
        let origin = DevOrigin::new(&RuntimeConfig::default()).unwrap();
        let uri: Uri = "/dashboard/?tab=2".parse().unwrap();
        assert_eq!(origin.url_for(&uri), "http://localhost:3001/dashboard/?tab=2");
    }

    #[test]
    fn test_invalid_origin_host_rejected() {
        let mut config = RuntimeConfig::default();
        config.dev.host = "bad host".to_string();
        assert!(matches!(DevOrigin::new(&config), Err(ServerError::Origin(_))));
    }

    #[test]
    fn test_slash_redirect_keeps_query() {
        let uri: Uri = "/dashboard?tab=2".parse().unwrap();
        let Some(Outcome::Respond(response)) = DevPageHandler::slash_redirect(&uri) else {
            panic!("expected a redirect");
        };
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard/?tab=2");
    }
}
