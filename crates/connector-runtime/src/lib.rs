//! # Connector Runtime Library
//!
//! Exposes the composition root of the connector for tests. The main entry
//! point is the `main.rs` binary.
//!
//! ## Modules
//!
//! - `container/` - Runtime configuration loaded from the environment
//! - `handlers/` - Built-in message handlers
//! - `bootstrap` - Explicit handler table and dispatcher wiring
//! - `telemetry` - Logging setup

pub mod bootstrap;
pub mod container;
pub mod handlers;
pub mod telemetry;

pub use bootstrap::{BootstrapError, Connector};
pub use container::{ConfigLoadError, LogConfig, RuntimeConfig};
