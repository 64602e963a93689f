//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (mode from NODE_ENV)
//!     → loader.rs (optional page-front.toml → PartialConfig)
//!     → builder.rs (merge partials, register routes, CLI overrides)
//!     → build(): route table finalized
//!     → RuntimeConfig (immutable, shared via Arc with every handler)
//! ```
//!
//! # Design Decisions
//! - Config files are data, evaluated once at a defined point in startup
//! - All fields have defaults; an absent config file is not an error
//! - Routes accumulate across layers; duplicate names fail fast
//! - Mutating configuration after serving begins is not supported

pub mod builder;
pub mod loader;
pub mod schema;

pub use builder::ConfigBuilder;
pub use loader::{discover_config, load_from_dir, load_partial, ConfigError, CONFIG_FILE_NAMES};
pub use schema::{
    BundlerConfig, DevOriginConfig, ListenerConfig, Mode, ObservabilityConfig, PartialConfig,
    RuntimeConfig, TimeoutConfig, MODE_ENV_VAR,
};
