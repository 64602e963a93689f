//! Request path classification.
//!
//! # Responsibilities
//! - Detect static asset paths (trailing file extension)
//! - Normalize trailing slashes
//! - Match a request path against a registered route path
//!
//! # Design Decisions
//! - Asset detection is a heuristic: extensionless files are missed, and a
//!   dotted final segment such as `/releases/v1.2` is treated as an asset
//! - Path matching is case-sensitive
//! - The root path `/` never normalizes to an empty string

use std::sync::LazyLock;

use regex::Regex;

/// A dot followed by one or more ASCII word characters at the very end.
static STATIC_ASSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9_]+$").expect("static asset pattern is valid"));

/// Returns true if the path looks like a request for a file with an extension.
pub fn is_static_asset_path(path: &str) -> bool {
    STATIC_ASSET_PATTERN.is_match(path)
}

/// Appends `/` unless the path already ends with one.
pub fn add_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Strips one trailing `/`, except for the root path.
pub fn remove_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path.to_string(),
    }
}

/// Exact route match, regardless of how either side spells its trailing slash.
///
/// Sub-paths do not match: `/admin/users` is not `/admin`.
pub fn path_matches_route(requested: &str, route_path: &str) -> bool {
    requested == remove_trailing_slash(route_path) || requested == add_trailing_slash(route_path)
}

/// Exact match, or any path below `route_path/`.
///
/// This is the wildcard mount used for page routes: every sub-path of the
/// route reaches the same handler so client-side routing can take over.
pub fn is_under_route(requested: &str, route_path: &str) -> bool {
    path_matches_route(requested, route_path)
        || requested.starts_with(&add_trailing_slash(route_path))
}
