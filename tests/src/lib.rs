//! # MeshTwin Test Suite
//!
//! Unified test crate for cross-crate behavior:
//!
//! ```text
//! tests/src/integration/
//! ├── convergence.rs   # replica convergence under reordered gossip
//! ├── propagation.rs   # subscribe on one node, route from the others
//! └── failure.rs       # crashes, pruning, restarts, resurrection
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p twin-tests
//! cargo test -p twin-tests integration::failure::
//! ```

#![allow(dead_code)]

pub mod integration;
