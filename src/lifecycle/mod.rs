//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (server.rs):
//!     Build config → Assemble handlers → (prod) build if needed
//!     → (dev) start dev server → Serve
//!
//! Shutdown (shutdown.rs + signals.rs):
//!     Ctrl+C / SIGTERM → Shutdown::trigger → stop accepting → drain
//!     → stop dev server → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
