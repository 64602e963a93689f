//! Multi-route front-end server.
//!
//! Serves several independently bundled pages, each under its own URL
//! prefix. In development, page requests are proxied to the bundler's live
//! reload dev server and asset requests are redirected to it; in production,
//! built files are served from the bundler's output directory.

pub mod bundler;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use bundler::{Bundler, CommandBundler};
pub use config::{ConfigBuilder, Mode, PartialConfig, RuntimeConfig};
pub use http::{listen, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{Route, RouteTable};
