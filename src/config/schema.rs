//! Configuration schema definitions.
//!
//! `RuntimeConfig` is the finalized, read-only configuration every handler
//! sees. `PartialConfig` is what a config file (or host code) supplies: every
//! field optional, merged over the defaults by `ConfigBuilder`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::routing::{Route, RouteTable};

/// Environment variable selecting production vs development.
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Serving mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    #[default]
    Development,
}

impl Mode {
    /// `production` selects production; any other value, or none, is development.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => Mode::Production,
            _ => Mode::Development,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Production => "production",
            Mode::Development => "development",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Mode::Production),
            "development" => Ok(Mode::Development),
            other => Err(format!("unknown mode `{other}` (expected production or development)")),
        }
    }
}

/// Finalized runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub mode: Mode,

    /// Live-reload dev origin settings.
    pub dev: DevOriginConfig,

    /// Forwarded to the bundler dev server as its clear-console option.
    pub clear_screen: bool,

    pub listener: ListenerConfig,

    pub timeouts: TimeoutConfig,

    pub bundler: BundlerConfig,

    pub observability: ObservabilityConfig,

    pub(crate) routes: RouteTable,
}

impl RuntimeConfig {
    /// Finalized route table, most specific path first.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Base URL of the dev origin, without a trailing slash.
    pub fn dev_origin(&self) -> String {
        self.dev.origin()
    }
}

/// Dev origin (bundler dev server) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevOriginConfig {
    /// Host the dev server is reachable on.
    pub host: String,

    /// Port the dev server binds.
    pub port: u16,

    /// Total budget for one fetch against the dev origin.
    pub fetch_timeout_ms: u64,

    /// Reload-client references rewritten to absolute dev-origin URLs.
    pub reload_markers: Vec<String>,

    /// Redirect page requests lacking a trailing slash to `path/`.
    pub redirect_trailing_slash: bool,
}

impl DevOriginConfig {
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for DevOriginConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3001,
            fetch_timeout_ms: 5_000,
            reload_markers: vec!["/@react-refresh".to_string(), "/@vite/client".to_string()],
            redirect_trailing_slash: false,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout towards the dev origin, in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 2,
            request_secs: 30,
        }
    }
}

/// External bundler command configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Program to run (e.g. `npx`).
    pub program: String,

    /// Arguments for a one-off production build.
    pub build_args: Vec<String>,

    /// Arguments for the long-lived dev server. `{port}` and
    /// `{clear_screen}` are substituted.
    pub dev_args: Vec<String>,

    /// Project root the bundler runs in.
    pub root: PathBuf,

    /// Build output directory, relative to `root`.
    pub out_dir: PathBuf,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            build_args: vec!["vite".to_string(), "build".to_string()],
            dev_args: vec![
                "vite".to_string(),
                "--port".to_string(),
                "{port}".to_string(),
                "--strictPort".to_string(),
                "--clearScreen".to_string(),
                "{clear_screen}".to_string(),
            ],
            root: PathBuf::from("."),
            out_dir: PathBuf::from("dist"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "page_front=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A partial configuration, as read from a config file.
///
/// Sections replace the current section wholesale; routes accumulate.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PartialConfig {
    pub mode: Option<Mode>,

    #[serde(alias = "clearScreen")]
    pub clear_screen: Option<bool>,

    /// Shorthand for `dev.port`, applied after the `dev` section.
    #[serde(alias = "vitePort")]
    pub dev_port: Option<u16>,

    pub dev: Option<DevOriginConfig>,

    pub listener: Option<ListenerConfig>,

    pub timeouts: Option<TimeoutConfig>,

    pub bundler: Option<BundlerConfig>,

    pub observability: Option<ObservabilityConfig>,

    pub routes: Vec<Route>,
}
