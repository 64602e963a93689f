//! page-front
//!
//! Serves several independently bundled front-end pages from one HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                     PAGE FRONT                       │
//!  Client Request     │  ┌──────────┐    ┌────────────┐    ┌──────────────┐  │
//!  ───────────────────┼─▶│  axum    │───▶│  dispatch  │───▶│  PreStatic   │──┼──▶ dev origin (302)
//!                     │  │  router  │    │   stack    │    │  assets      │  │    or dist/ files
//!                     │  └──────────┘    └─────┬──────┘    └──────────────┘  │
//!                     │                        │ next                        │
//!                     │                        ▼                             │
//!                     │                 ┌──────────────┐                     │
//!  Client Response    │                 │   Routes     │─────────────────────┼──▶ dev origin HTML
//!  ◀──────────────────┼─────────────────│ (specific    │                     │    (rewritten) or
//!                     │                 │  first)      │                     │    dist/<route>/index.html
//!                     │                 └──────┬───────┘                     │
//!                     │                        │ next                        │
//!                     │                        ▼                             │
//!                     │                 ┌──────────────┐                     │
//!                     │                 │ Fallback/404 │                     │
//!                     │                 └──────────────┘                     │
//!                     │                                                      │
//!                     │  config · bundler · observability · lifecycle        │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use page_front::bundler::{BuildInput, Bundler, CommandBundler};
use page_front::config::{load_from_dir, load_partial, ConfigBuilder, Mode, RuntimeConfig};
use page_front::lifecycle::{signals, Shutdown};
use page_front::observability::{logging, metrics};
use page_front::HttpServer;

#[derive(Parser)]
#[command(name = "page-front")]
#[command(about = "Serve bundled front-end pages under their own URL prefixes", long_about = None)]
struct Cli {
    /// Config file (defaults to page-front.toml and friends in the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// production or development (overrides NODE_ENV)
    #[arg(long)]
    mode: Option<Mode>,

    /// Port the bundler dev server listens on
    #[arg(long)]
    dev_port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the server (default)
    Serve,
    /// Run one production build with the registered entry points
    Build,
    /// Print the route table and the bundler input map
    Routes,
}

fn load(cli: &Cli) -> Result<(RuntimeConfig, Option<PathBuf>), Box<dyn std::error::Error>> {
    let mut builder = ConfigBuilder::from_env();

    let source = match &cli.config {
        Some(path) => {
            builder.set(load_partial(path)?)?;
            Some(path.clone())
        }
        None => match load_from_dir(&std::env::current_dir()?)? {
            Some((path, partial)) => {
                builder.set(partial)?;
                Some(path)
            }
            None => None,
        },
    };

    if let Some(mode) = cli.mode {
        builder.mode(mode);
    }
    if let Some(port) = cli.dev_port {
        builder.dev_port(port);
    }
    if let Some(bind) = &cli.bind {
        builder.bind_address(bind.clone());
    }

    Ok((builder.build(), source))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (config, source) = load(&cli)?;

    logging::init(&config.observability);

    tracing::info!(
        source = ?source,
        mode = %config.mode,
        bind_address = %config.listener.bind_address,
        dev_origin = %config.dev_origin(),
        routes = config.routes().len(),
        "Configuration loaded"
    );

    let bundler = Arc::new(CommandBundler::new(config.bundler.clone()));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Routes => {
            for route in config.routes() {
                println!("{:<24} {:<32} {}", route.path, route.file, route.name);
            }
            let input = BuildInput::from_routes(config.routes());
            println!("{}", serde_json::to_string_pretty(&input)?);
        }
        Commands::Build => {
            bundler.build(&BuildInput::from_routes(config.routes())).await?;
        }
        Commands::Serve => {
            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr),
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let bind_address = config.listener.bind_address.clone();
            let server = HttpServer::new(config, bundler).await?;
            let listener = tokio::net::TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");

            let shutdown = Shutdown::new();
            let server_shutdown = shutdown.subscribe();
            tokio::spawn(async move {
                signals::wait_for_termination().await;
                shutdown.trigger();
            });

            server.run(listener, server_shutdown).await?;
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}
