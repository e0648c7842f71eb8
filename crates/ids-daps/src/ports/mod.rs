//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the dispatcher uses
//! - **Outbound (Driven)**: key material this crate needs

pub mod inbound;
pub mod outbound;
