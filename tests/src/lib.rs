//! # IDS Connector Test Suite
//!
//! Unified test crate for flows that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mod.rs        # Shared fixtures: signer, keys, messages
//!     ├── flows.rs      # Dispatcher pipeline with real DAT verification
//!     └── endpoint.rs   # Multipart requests through the assembled connector
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ids-tests
//! cargo test -p ids-tests integration::endpoint::
//! ```

pub mod integration;
