//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (before serving):
//!     Route { path, file, name }
//!     → router.rs (validate, append, reject duplicate names)
//!     → finalize (sort by path, descending)
//!     → RouteTable (immutable once handed to the server)
//!
//! Incoming request path:
//!     → matcher.rs (static asset? exact route? sub-path of route?)
//!     → dispatch decides: proxy, serve built file, or fall through
//! ```
//!
//! # Design Decisions
//! - Longest / lexicographically later prefixes sort first, so they are
//!   installed (and therefore matched) before shorter ones
//! - Classification is purely syntactic, never touches the filesystem
//! - First match wins in table order

pub mod matcher;
pub mod router;

pub use matcher::{
    add_trailing_slash, is_static_asset_path, is_under_route, path_matches_route,
    remove_trailing_slash,
};
pub use router::{Route, RouteError, RouteTable};
