//! # Domain Layer
//!
//! Configuration, error taxonomy and response types of the dispatcher.

pub mod builder;
pub mod config;
pub mod error;
pub mod response;
