//! HTTP server setup and handler assembly.
//!
//! # Responsibilities
//! - Install handlers in precedence order for the configured mode
//! - Build the Axum router and wire middleware (trace, request ID, timeout)
//! - Production: build once if the output directory is missing
//! - Development: start the bundler dev server
//! - Serve until shutdown, then stop the dev server
//!
//! # Install Order
//! ```text
//! 1. PreStatic  dev: asset redirect to dev origin | prod: static file server
//! 2. Routes     one handler per route, most specific path first
//! 3. Fallback   host-supplied handlers, then a plain 404
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::bundler::{BuildInput, Bundler, BundlerError, DevServerHandle, DevServerOptions};
use crate::config::{Mode, RuntimeConfig};
use crate::http::dev_proxy::{AssetRedirectHandler, DevOrigin, DevPageHandler, ReloadClientRewriter};
use crate::http::dispatch::{dispatch_handler, Group, HandlerStack, Mount, PageHandler};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::http::static_files::{ensure_output, RoutePageHandler, StaticAssetHandler};
use crate::lifecycle::shutdown::signalled;

/// Errors raised while assembling or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bundler error: {0}")]
    Bundler(#[from] BundlerError),

    #[error("failed to create dev origin client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid dev origin: {0}")]
    Origin(#[from] url::ParseError),

    #[error("invalid reload marker: {0}")]
    Markers(#[from] regex::Error),
}

/// Install every handler the configuration calls for.
pub async fn assemble(config: &RuntimeConfig, bundler: &dyn Bundler) -> Result<HandlerStack, ServerError> {
    let mut stack = HandlerStack::new();

    match config.mode {
        Mode::Development => {
            let origin = DevOrigin::new(config)?;
            let rewriter = Arc::new(ReloadClientRewriter::new(
                origin.base(),
                config.dev.reload_markers.as_slice(),
            )?);

            stack.install(
                Group::PreStatic,
                Mount::Any,
                Arc::new(AssetRedirectHandler::new(origin.clone())),
            );
            for route in config.routes() {
                stack.install(
                    Group::Routes,
                    Mount::Route(route.path.clone()),
                    Arc::new(DevPageHandler::new(
                        origin.clone(),
                        route.clone(),
                        rewriter.clone(),
                        config.dev.redirect_trailing_slash,
                    )),
                );
            }
        }
        Mode::Production => {
            let out_dir = bundler.out_dir();
            tracing::info!(out_dir = %out_dir.display(), "Serving build output");
            ensure_output(&out_dir, bundler, &BuildInput::from_routes(config.routes())).await?;

            stack.install(Group::PreStatic, Mount::Any, Arc::new(StaticAssetHandler::new(&out_dir)));
            for route in config.routes() {
                stack.install(
                    Group::Routes,
                    Mount::Route(route.path.clone()),
                    Arc::new(RoutePageHandler::new(&out_dir, route.clone())),
                );
            }
        }
    }

    Ok(stack)
}

/// Builds an [`HttpServer`], optionally with host fallback handlers.
pub struct ServerBuilder {
    config: RuntimeConfig,
    bundler: Arc<dyn Bundler>,
    fallbacks: Vec<(Mount, Arc<dyn PageHandler>)>,
}

impl ServerBuilder {
    pub fn new(config: RuntimeConfig, bundler: Arc<dyn Bundler>) -> Self {
        Self {
            config,
            bundler,
            fallbacks: Vec::new(),
        }
    }

    /// Add a handler evaluated after every route handler.
    pub fn fallback(mut self, mount: Mount, handler: Arc<dyn PageHandler>) -> Self {
        self.fallbacks.push((mount, handler));
        self
    }

    pub async fn build(self) -> Result<HttpServer, ServerError> {
        let config = self.config;
        tracing::info!(mode = %config.mode, routes = config.routes().len(), "Assembling handlers");

        let mut stack = assemble(&config, self.bundler.as_ref()).await?;
        for (mount, handler) in self.fallbacks {
            stack.install(Group::Fallback, mount, handler);
        }

        for (group, mount, name) in stack.describe() {
            tracing::debug!(group = ?group, mount = %mount, handler = name, "Handler installed");
        }

        let dev_server = match config.mode {
            Mode::Development => {
                let options = DevServerOptions {
                    port: config.dev.port,
                    clear_screen: config.clear_screen,
                };
                let input = BuildInput::from_routes(config.routes());
                let handle = self.bundler.start_dev_server(&options, &input).await?;
                tracing::info!(origin = %config.dev_origin(), "Dev origin configured");
                Some(handle)
            }
            Mode::Production => None,
        };

        let stack = Arc::new(stack);
        let router = build_router(&config, stack.clone());

        Ok(HttpServer {
            router,
            config: Arc::new(config),
            stack,
            dev_server,
        })
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
fn build_router(config: &RuntimeConfig, stack: Arc<HandlerStack>) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    });

    Router::new()
        .fallback(dispatch_handler)
        .with_state(stack)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(trace)
        .layer(set_request_id_layer())
}

/// Multi-route page server.
pub struct HttpServer {
    router: Router,
    config: Arc<RuntimeConfig>,
    stack: Arc<HandlerStack>,
    dev_server: Option<DevServerHandle>,
}

impl HttpServer {
    /// Assemble a server with no host fallback handlers.
    pub async fn new(config: RuntimeConfig, bundler: Arc<dyn Bundler>) -> Result<Self, ServerError> {
        ServerBuilder::new(config, bundler).build().await
    }

    pub fn builder(config: RuntimeConfig, bundler: Arc<dyn Bundler>) -> ServerBuilder {
        ServerBuilder::new(config, bundler)
    }

    /// The finalized configuration every handler reads.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerStack {
        &self.stack
    }

    /// The router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mode = %self.config.mode, "HTTP server starting");

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(signalled(shutdown))
            .await;

        if let Some(dev_server) = self.dev_server {
            dev_server.stop().await;
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Assemble a server and serve it on the configured bind address.
pub async fn listen(
    config: RuntimeConfig,
    bundler: Arc<dyn Bundler>,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, bundler).await?;
    let listener = TcpListener::bind(&bind_address).await?;
    server.run(listener, shutdown).await
}
