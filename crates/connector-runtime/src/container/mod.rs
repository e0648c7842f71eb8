//! # Runtime Container
//!
//! Configuration of the connector runtime.

pub mod config;

pub use config::{ConfigLoadError, LogConfig, RuntimeConfig};
