//! # Domain Layer
//!
//! Pure token and claims logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod claims;
pub mod entities;
pub mod errors;
pub mod rules;
pub mod token;
