//! Utility functions and helpers.
//!
//! Common functionality used across multiple reqs crates.

pub mod hash;
pub mod path;

// Re-export commonly used utilities
pub use hash::{blake3_hex, matches_fingerprint};
pub use path::{display_relative, normalize_path, resolve_relative};
