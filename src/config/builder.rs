//! Configuration builder.
//!
//! Layers, lowest precedence first: defaults (mode from the environment),
//! partial configs in the order they are `set`, then individual overrides.
//! `build` finalizes the route table; the result is read-only.

use crate::config::schema::{Mode, PartialConfig, RuntimeConfig};
use crate::routing::{Route, RouteError};

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: RuntimeConfig,
}

impl ConfigBuilder {
    /// Defaults with development mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the mode taken from `NODE_ENV`.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        builder.config.mode = Mode::from_env();
        builder
    }

    /// Merge a partial configuration. Sections are replaced; routes are appended.
    pub fn set(&mut self, partial: PartialConfig) -> Result<&mut Self, RouteError> {
        let PartialConfig {
            mode,
            clear_screen,
            dev_port,
            dev,
            listener,
            timeouts,
            bundler,
            observability,
            routes,
        } = partial;

        if let Some(mode) = mode {
            self.config.mode = mode;
        }
        if let Some(clear_screen) = clear_screen {
            self.config.clear_screen = clear_screen;
        }
        if let Some(dev) = dev {
            self.config.dev = dev;
        }
        if let Some(port) = dev_port {
            self.config.dev.port = port;
        }
        if let Some(listener) = listener {
            self.config.listener = listener;
        }
        if let Some(timeouts) = timeouts {
            self.config.timeouts = timeouts;
        }
        if let Some(bundler) = bundler {
            self.config.bundler = bundler;
        }
        if let Some(observability) = observability {
            self.config.observability = observability;
        }

        self.register(routes)
    }

    /// Append routes. Routes accumulate across calls and are never replaced.
    pub fn register(&mut self, routes: impl IntoIterator<Item = Route>) -> Result<&mut Self, RouteError> {
        self.config.routes.register_all(routes)?;
        Ok(self)
    }

    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.config.mode = mode;
        self
    }

    pub fn dev_port(&mut self, port: u16) -> &mut Self {
        self.config.dev.port = port;
        self
    }

    pub fn bind_address(&mut self, address: impl Into<String>) -> &mut Self {
        self.config.listener.bind_address = address.into();
        self
    }

    /// Current, not yet finalized, configuration.
    pub fn peek(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn build(mut self) -> RuntimeConfig {
        self.config.routes.finalize();
        self.config
    }
}
