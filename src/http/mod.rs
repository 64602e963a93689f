//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router: request ID, trace, timeout)
//!     → dispatch.rs (ordered handler stack)
//!         → dev_proxy.rs    (development: dev origin redirect / proxy + rewrite)
//!         → static_files.rs (production: built files / route HTML shell)
//!         → host fallbacks
//!     → 404 if nothing responded
//! ```

pub mod dev_proxy;
pub mod dispatch;
pub mod request;
pub mod server;
pub mod static_files;

pub use dispatch::{Group, HandlerStack, Mount, Outcome, PageHandler};
pub use request::X_REQUEST_ID;
pub use server::{assemble, listen, HttpServer, ServerBuilder, ServerError};
