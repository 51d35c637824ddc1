//! reqs benchmarking suite
//!
//! Benchmarks for manifest parsing, canonical rendering, the lint rules
//! and the import audit.

pub mod common;

pub use common::*;
