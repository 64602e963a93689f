//! Bundler integration.
//!
//! # Data Flow
//! ```text
//! RouteTable.to_build_input_map()
//!     → BuildInput { entries, empty_out_dir }
//!     → Bundler::build            (production: produce out_dir)
//!     → Bundler::start_dev_server (development: long-lived dev origin)
//!     → Bundler::out_dir          (production: where built pages live)
//! ```
//!
//! # Design Decisions
//! - The bundler is opaque: the server only asks it to build, to start a
//!   dev server, and where its output lands
//! - Boxed futures keep the trait object-safe so hosts and tests can plug
//!   in their own implementation
//! - Every build clears the output directory first

pub mod command;

use std::collections::BTreeMap;
use std::path::PathBuf;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Child;

use crate::routing::RouteTable;

pub use command::CommandBundler;

/// Errors raised by bundler operations.
#[derive(Debug, Error)]
pub enum BundlerError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: String },

    #[error("failed to encode bundler input: {0}")]
    Input(#[from] serde_json::Error),
}

/// Multi-entry input handed to the bundler before each build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInput {
    /// Entry name → entry file.
    pub entries: BTreeMap<String, String>,

    /// Clear the output directory before writing.
    pub empty_out_dir: bool,
}

impl BuildInput {
    pub fn from_routes(routes: &RouteTable) -> Self {
        Self {
            entries: routes.to_build_input_map(),
            empty_out_dir: true,
        }
    }
}

/// Options for the long-lived dev server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServerOptions {
    pub port: u16,
    pub clear_screen: bool,
}

/// A running dev server. Dropping the handle kills the child process.
#[derive(Debug)]
pub struct DevServerHandle {
    child: Option<Child>,
}

impl DevServerHandle {
    pub fn from_child(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// A handle for a dev server this process does not own.
    pub fn detached() -> Self {
        Self { child: None }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Kill the dev server and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to stop dev server");
            }
        }
    }
}

/// External bundler collaborator.
pub trait Bundler: Send + Sync {
    /// Run a one-off production build.
    fn build<'a>(&'a self, input: &'a BuildInput) -> BoxFuture<'a, Result<(), BundlerError>>;

    /// Start the live-reload dev server.
    fn start_dev_server<'a>(
        &'a self,
        options: &'a DevServerOptions,
        input: &'a BuildInput,
    ) -> BoxFuture<'a, Result<DevServerHandle, BundlerError>>;

    /// Resolved build output directory.
    fn out_dir(&self) -> PathBuf;
}
