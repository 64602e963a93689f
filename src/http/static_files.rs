//! Production-mode handlers serving the bundler's build output.
//!
//! # Responsibilities
//! - Serve literal built files (JS, CSS, images) from the output directory
//! - Serve a route's `index.html` shell for every path under the route
//! - Build once at startup when the output directory is missing
//!
//! # Design Decisions
//! - The file server declines (falls through) on 404 and 405 so page routes
//!   get a chance; any other status, including errors, is returned as is
//! - A missing `index.html` for a route is the file server's own 404

use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{request::Parts, Request, StatusCode},
    response::IntoResponse,
};
use futures_util::future::BoxFuture;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::bundler::{BuildInput, Bundler, BundlerError};
use crate::http::dispatch::{Outcome, PageHandler};
use crate::routing::Route;

/// Rebuild a body-less request from the head so it can be re-served.
fn head_only(parts: &Parts) -> Request<Body> {
    let mut request = Request::new(Body::empty());
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    request
}

/// Location of a route's HTML shell inside the output directory.
pub fn route_index_file(out_dir: &Path, route_path: &str) -> PathBuf {
    let relative = route_path.trim_matches('/');
    if relative.is_empty() {
        out_dir.join("index.html")
    } else {
        out_dir.join(relative).join("index.html")
    }
}

/// Run a build if the output directory does not exist yet.
///
/// Returns whether a build was triggered.
pub async fn ensure_output(
    out_dir: &Path,
    bundler: &dyn Bundler,
    input: &BuildInput,
) -> Result<bool, BundlerError> {
    if tokio::fs::try_exists(out_dir).await.unwrap_or(false) {
        return Ok(false);
    }

    tracing::warn!(out_dir = %out_dir.display(), "Static files not found, building");
    bundler.build(input).await?;
    Ok(true)
}

/// Global static file server rooted at the output directory.
pub struct StaticAssetHandler {
    serve_dir: ServeDir,
}

impl StaticAssetHandler {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            serve_dir: ServeDir::new(out_dir),
        }
    }
}

impl PageHandler for StaticAssetHandler {
    fn name(&self) -> &'static str {
        "static-files"
    }

    fn handle<'a>(&'a self, request: &'a Parts) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let response = match self.serve_dir.clone().oneshot(head_only(request)).await {
                Ok(response) => response,
                Err(never) => match never {},
            };

            match response.status() {
                StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => Outcome::Next,
                _ => Outcome::Respond(response.into_response()),
            }
        })
    }
}

/// Serves one route's `index.html` for the route and all its sub-paths.
pub struct RoutePageHandler {
    route: Route,
    index_file: PathBuf,
}

impl RoutePageHandler {
    pub fn new(out_dir: &Path, route: Route) -> Self {
        let index_file = route_index_file(out_dir, &route.path);
        Self { route, index_file }
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }
}

impl PageHandler for RoutePageHandler {
    fn name(&self) -> &'static str {
        "static-page"
    }

    fn handle<'a>(&'a self, request: &'a Parts) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let response = match ServeFile::new(&self.index_file).oneshot(head_only(request)).await {
                Ok(response) => response,
                Err(never) => match never {},
            };

            if response.status() == StatusCode::NOT_FOUND {
                tracing::warn!(
                    route = %self.route.name,
                    file = %self.index_file.display(),
                    "Route shell missing from build output"
                );
            }
            Outcome::Respond(response.into_response())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parts(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    async fn text(outcome: Outcome) -> (StatusCode, String) {
        let Outcome::Respond(response) = outcome else {
            panic!("expected a response");
        };
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_route_index_file() {
        let out = Path::new("/srv/dist");
        assert_eq!(route_index_file(out, "/admin"), PathBuf::from("/srv/dist/admin/index.html"));
        assert_eq!(route_index_file(out, "/admin/"), PathBuf::from("/srv/dist/admin/index.html"));
        assert_eq!(route_index_file(out, "/a/b"), PathBuf::from("/srv/dist/a/b/index.html"));
        assert_eq!(route_index_file(out, "/"), PathBuf::from("/srv/dist/index.html"));
    }

    #[tokio::test]
    async fn test_asset_served_and_missing_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();

        let handler = StaticAssetHandler::new(dir.path());
        let (status, body) = text(handler.handle(&parts("/assets/app.js")).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log(1)");

        assert!(handler.handle(&parts("/assets/missing.js")).await.is_next());
        assert!(handler.handle(&parts("/admin/settings")).await.is_next());
    }

    #[tokio::test]
    async fn test_route_shell_for_sub_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("admin")).unwrap();
        fs::write(dir.path().join("admin/index.html"), "<h1>admin</h1>").unwrap();

        let handler = RoutePageHandler::new(dir.path(), Route::new("/admin", "admin.tsx", "admin"));
        let (status, body) = text(handler.handle(&parts("/admin/settings")).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>admin</h1>");
    }

    #[tokio::test]
    async fn test_missing_shell_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handler = RoutePageHandler::new(dir.path(), Route::new("/ghost", "ghost.tsx", "ghost"));
        let (status, _) = text(handler.handle(&parts("/ghost/")).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
