//! Bundler driven through an external command.
//!
//! The entry map reaches the bundler's config through environment variables:
//! `PAGE_FRONT_INPUT` holds the JSON-encoded `BuildInput::entries`, and
//! `PAGE_FRONT_EMPTY_OUT_DIR` is `1` when the output directory must be cleared.

use std::path::PathBuf;
use std::process::Stdio;

use futures_util::future::BoxFuture;
use tokio::process::Command;

use super::{BuildInput, Bundler, BundlerError, DevServerHandle, DevServerOptions};
use crate::config::BundlerConfig;

pub const INPUT_ENV_VAR: &str = "PAGE_FRONT_INPUT";
pub const EMPTY_OUT_DIR_ENV_VAR: &str = "PAGE_FRONT_EMPTY_OUT_DIR";

#[derive(Debug, Clone)]
pub struct CommandBundler {
    config: BundlerConfig,
}

impl CommandBundler {
    pub fn new(config: BundlerConfig) -> Self {
        Self { config }
    }

    fn command(&self, args: &[String], input: &BuildInput) -> Result<Command, BundlerError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(args)
            .current_dir(&self.config.root)
            .env(INPUT_ENV_VAR, serde_json::to_string(&input.entries)?)
            .env(EMPTY_OUT_DIR_ENV_VAR, if input.empty_out_dir { "1" } else { "0" })
            .stdin(Stdio::null());
        Ok(cmd)
    }

    fn spawn_error(&self, source: std::io::Error) -> BundlerError {
        BundlerError::Spawn {
            program: self.config.program.clone(),
            source,
        }
    }
}

/// Substitute `{port}` and `{clear_screen}` placeholders.
fn dev_args(template: &[String], options: &DevServerOptions) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            arg.replace("{port}", &options.port.to_string())
                .replace("{clear_screen}", &options.clear_screen.to_string())
        })
        .collect()
}

impl Bundler for CommandBundler {
    fn build<'a>(&'a self, input: &'a BuildInput) -> BoxFuture<'a, Result<(), BundlerError>> {
        Box::pin(async move {
            tracing::info!(
                program = %self.config.program,
                entries = input.entries.len(),
                "Running bundler build"
            );

            let status = self
                .command(&self.config.build_args, input)?
                .status()
                .await
                .map_err(|e| self.spawn_error(e))?;

            if !status.success() {
                return Err(BundlerError::Failed {
                    program: self.config.program.clone(),
                    status: status.to_string(),
                });
            }

            tracing::info!(out_dir = %self.out_dir().display(), "Bundler build finished");
            Ok(())
        })
    }

    fn start_dev_server<'a>(
        &'a self,
        options: &'a DevServerOptions,
        input: &'a BuildInput,
    ) -> BoxFuture<'a, Result<DevServerHandle, BundlerError>> {
        Box::pin(async move {
            let args = dev_args(&self.config.dev_args, options);
            let child = self
                .command(&args, input)?
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| self.spawn_error(e))?;

            tracing::info!(
                program = %self.config.program,
                port = options.port,
                pid = ?child.id(),
                "Dev server started"
            );
            Ok(DevServerHandle::from_child(child))
        })
    }

    fn out_dir(&self) -> PathBuf {
        self.config.root.join(&self.config.out_dir)
    }
}
