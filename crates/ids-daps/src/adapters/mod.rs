//! # Adapters Module
//!
//! Infrastructure adapters implementing the ports.

pub mod key_cache;
pub mod static_keys;
