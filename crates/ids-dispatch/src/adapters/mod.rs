//! # Adapters Module
//!
//! Transport adapters in front of the dispatcher.

pub mod http;
