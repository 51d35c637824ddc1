//! # reqs-core
//!
//! Core types and utilities shared across all reqs crates.
//!
//! This crate provides:
//! - PEP 440 `Version` and `SpecifierSet` types
//! - `Requirement` declarations and the `DependencySet` they form
//! - Source-control and direct URL sources
//! - `ReqsError` enum for unified error handling
//! - Lint rule identifiers and levels shared by config and checker
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Requirement, DependencySet, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Fingerprinting and path helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{ReqsError, ReqsResult};
pub use types::{
    Declaration, DependencySet, Level, PackageName, Requirement, RuleId, Source, Specifier,
    SpecifierSet, VcsReference, Version,
};
