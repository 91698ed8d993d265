//! End-to-end tests for restore-rs crates.
//!
//! These exercise decode -> filter -> encode across crate boundaries.
