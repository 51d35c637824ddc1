//! Core data types for requirement manifests.
//!
//! This module provides the fundamental types used throughout reqs:
//! - Package names and PEP 440 versions
//! - Version specifiers and direct sources
//! - Requirement declarations and the set they form
//! - Lint rule identifiers

pub mod lint;
pub mod name;
pub mod requirement;
pub mod set;
pub mod source;
pub mod specifier;
pub mod version;

// Re-export all public types
pub use lint::{Level, RuleId, UnknownName};
pub use name::{NameError, PackageName};
pub use requirement::{HashAlgorithm, HashDigest, Requirement, RequirementError};
pub use set::{Declaration, DeclarationKey, DependencySet};
pub use source::{Source, SourceError, VcsKind, VcsReference};
pub use specifier::{Op, Specifier, SpecifierError, SpecifierSet};
pub use version::{PreKind, Version, VersionError};
