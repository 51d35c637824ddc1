//! Package names.
//!
//! Names keep their original spelling for display but compare, hash and
//! order by their normalized form, so `PyYAML`, `pyyaml` and `py_yaml`
//! style variants collapse onto one key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Package name as written, with its normalized form
#[derive(Debug, Clone)]
pub struct PackageName {
    raw: String,
    normalized: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Invalid package name '{name}': names must start and end with a letter or digit and contain only letters, digits, '-', '_' or '.'")]
    Invalid { name: String },
}

impl PackageName {
    /// Validate and wrap a package name
    pub fn new(raw: impl Into<String>) -> Result<Self, NameError> {
        let raw = raw.into();
        if !Self::is_valid(&raw) {
            return Err(NameError::Invalid { name: raw });
        }
        let normalized = Self::normalize(&raw);
        Ok(Self { raw, normalized })
    }

    /// Name as written in the manifest
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercase name with `-`, `_` and `.` runs collapsed to `-`
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Check if a string is a valid package name
    pub fn is_valid(name: &str) -> bool {
        let bytes = name.as_bytes();
        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) => {
                first.is_ascii_alphanumeric()
                    && last.is_ascii_alphanumeric()
                    && bytes
                        .iter()
                        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
            },
            _ => false,
        }
    }

    /// Normalize a name for comparison
    pub fn normalize(name: &str) -> String {
        let mut normalized = String::with_capacity(name.len());
        let mut in_separator = false;
        for c in name.chars() {
            if matches!(c, '-' | '_' | '.') {
                if !in_separator {
                    normalized.push('-');
                }
                in_separator = true;
            } else {
                normalized.push(c.to_ascii_lowercase());
                in_separator = false;
            }
        }
        normalized
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for PackageName {}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl FromStr for PackageName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for PackageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PackageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_package_names() {
        assert!(PackageName::is_valid("hypothesis"));
        assert!(PackageName::is_valid("pytest-xdist"));
        assert!(PackageName::is_valid("zope.interface"));
        assert!(PackageName::is_valid("eth_utils"));
        assert!(PackageName::is_valid("a"));

        assert!(!PackageName::is_valid(""));
        assert!(!PackageName::is_valid("-invalid"));
        assert!(!PackageName::is_valid("invalid."));
        assert!(!PackageName::is_valid("invalid@name"));
        assert!(!PackageName::is_valid("invalid space"));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(PackageName::normalize("PyYAML"), "pyyaml");
        assert_eq!(PackageName::normalize("eth_utils"), "eth-utils");
        assert_eq!(PackageName::normalize("Foo.._-Bar"), "foo-bar");
    }

    #[test]
    fn test_equality_uses_normalized_form() {
        let a = PackageName::new("Eth_Utils").unwrap();
        let b = PackageName::new("eth-utils").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Eth_Utils");
        assert_eq!(a.to_string(), "Eth_Utils");
        assert_eq!(a.normalized(), "eth-utils");
    }

    #[test]
    fn test_invalid_name_error() {
        let err = PackageName::new("bad name").unwrap_err();
        assert_eq!(
            err,
            NameError::Invalid {
                name: "bad name".to_string()
            }
        );
    }
}
