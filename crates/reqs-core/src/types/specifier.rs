//! Version specifiers (`==6.74.0`, `>=0.3.10`, `~=1.4`, `!=2.*`).

use super::version::{Version, VersionError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ordered comparison operator
///
/// Variant order is display order inside a set, so `>=1,<2` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    Equal,     // ==1.0
    GreaterEq, // >=1.0
    Greater,   // >1.0
    LessEq,    // <=1.0
    Less,      // <1.0
    NotEqual,  // !=1.0
}

/// Single version specifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specifier {
    /// `==`, `!=`, `<`, `<=`, `>`, `>=` against a full version
    Compare { op: Op, version: Version },
    /// `==1.2.*` or `!=1.2.*`
    Wildcard { negated: bool, prefix: Version },
    /// `~=1.4.2` (>=1.4.2, ==1.4.*)
    Compatible(Version),
    /// `===text`, exact string match
    Arbitrary(String),
}

/// Conjunction of specifiers (`>=1.0,<2.0`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierSet {
    specifiers: BTreeSet<Specifier>,
}

/// Specifier parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecifierError {
    #[error("Empty version specifier")]
    Empty,

    #[error("Missing comparison operator in '{input}'")]
    MissingOperator { input: String },

    #[error("Invalid version in specifier '{input}': {source}")]
    InvalidVersion {
        input: String,
        #[source]
        source: VersionError,
    },

    #[error("'~=' needs at least two release segments: '{input}'")]
    CompatibleTooShort { input: String },

    #[error("Local version labels are not allowed in '{input}'")]
    LocalNotAllowed { input: String },
}

impl Op {
    /// Operator text
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Equal => "==",
            Op::GreaterEq => ">=",
            Op::Greater => ">",
            Op::LessEq => "<=",
            Op::Less => "<",
            Op::NotEqual => "!=",
        }
    }
}

impl Specifier {
    /// Check if a version satisfies this specifier
    pub fn contains(&self, candidate: &Version) -> bool {
        match self {
            Specifier::Compare { op, version } => compare(*op, version, candidate),
            Specifier::Wildcard { negated, prefix } => {
                let matched = prefix_matches(prefix, prefix.release.len(), candidate);
                matched != *negated
            },
            Specifier::Compatible(version) => {
                candidate.without_local() >= *version
                    && prefix_matches(version, version.release.len() - 1, candidate)
            },
            Specifier::Arbitrary(text) => candidate.to_string().eq_ignore_ascii_case(text),
        }
    }

    /// The exact version this specifier pins, if any
    pub fn exact_version(&self) -> Option<&Version> {
        match self {
            Specifier::Compare {
                op: Op::Equal,
                version,
            } => Some(version),
            _ => None,
        }
    }
}

fn compare(op: Op, version: &Version, candidate: &Version) -> bool {
    let public = candidate.without_local();
    match op {
        Op::Equal => equal(version, candidate),
        Op::NotEqual => !equal(version, candidate),
        Op::LessEq => public <= *version,
        Op::GreaterEq => public >= *version,
        Op::Less => {
            // <V never admits a pre-release of V itself unless V is one
            public < *version
                && !(!version.is_prerelease()
                    && public.is_prerelease()
                    && public.base() == version.base())
        },
        Op::Greater => {
            // >V never admits a post-release of V itself unless V is one
            public > *version
                && !(!version.is_postrelease()
                    && public.is_postrelease()
                    && public.base() == version.base())
        },
    }
}

fn equal(version: &Version, candidate: &Version) -> bool {
    if version.local.is_some() {
        candidate == version
    } else {
        candidate.without_local() == *version
    }
}

fn prefix_matches(prefix: &Version, len: usize, candidate: &Version) -> bool {
    candidate.epoch == prefix.epoch
        && (0..len).all(|i| {
            candidate.release.get(i).copied().unwrap_or(0) == prefix.release.get(i).copied().unwrap_or(0)
        })
}

fn parse_version(input: &str, text: &str) -> Result<Version, SpecifierError> {
    text.parse().map_err(|source| SpecifierError::InvalidVersion {
        input: input.to_string(),
        source,
    })
}

fn reject_local(input: &str, version: Version) -> Result<Version, SpecifierError> {
    if version.local.is_some() {
        return Err(SpecifierError::LocalNotAllowed {
            input: input.to_string(),
        });
    }
    Ok(version)
}

impl FromStr for Specifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(SpecifierError::Empty);
        }

        if let Some(text) = input.strip_prefix("===") {
            let text = text.trim();
            if text.is_empty() || text.contains(char::is_whitespace) {
                return Err(SpecifierError::MissingOperator {
                    input: input.to_string(),
                });
            }
            return Ok(Specifier::Arbitrary(text.to_string()));
        }

        if let Some(text) = input.strip_prefix("~=") {
            let version = reject_local(input, parse_version(input, text)?)?;
            if version.release.len() < 2 {
                return Err(SpecifierError::CompatibleTooShort {
                    input: input.to_string(),
                });
            }
            return Ok(Specifier::Compatible(version));
        }

        let (op, text) = if let Some(stripped) = input.strip_prefix("==") {
            (Op::Equal, stripped)
        } else if let Some(stripped) = input.strip_prefix("!=") {
            (Op::NotEqual, stripped)
        } else if let Some(stripped) = input.strip_prefix(">=") {
            (Op::GreaterEq, stripped)
        } else if let Some(stripped) = input.strip_prefix("<=") {
            (Op::LessEq, stripped)
        } else if let Some(stripped) = input.strip_prefix('>') {
            (Op::Greater, stripped)
        } else if let Some(stripped) = input.strip_prefix('<') {
            (Op::Less, stripped)
        } else {
            return Err(SpecifierError::MissingOperator {
                input: input.to_string(),
            });
        };
        let text = text.trim();

        if matches!(op, Op::Equal | Op::NotEqual) {
            if let Some(prefix) = text.strip_suffix(".*") {
                let prefix = reject_local(input, parse_version(input, prefix)?)?;
                return Ok(Specifier::Wildcard {
                    negated: op == Op::NotEqual,
                    prefix,
                });
            }
            return Ok(Specifier::Compare {
                op,
                version: parse_version(input, text)?,
            });
        }

        let version = reject_local(input, parse_version(input, text)?)?;
        Ok(Specifier::Compare { op, version })
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specifier::Compare { op, version } => write!(f, "{}{}", op.as_str(), version),
            Specifier::Wildcard { negated, prefix } => {
                let op = if *negated { "!=" } else { "==" };
                write!(f, "{}{}.*", op, prefix)
            },
            Specifier::Compatible(version) => write!(f, "~={}", version),
            Specifier::Arbitrary(text) => write!(f, "==={}", text),
        }
    }
}

impl SpecifierSet {
    /// Create an empty (unconstrained) set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    /// Add a specifier; returns false if an equivalent one was already present
    pub fn insert(&mut self, specifier: Specifier) -> bool {
        self.specifiers.insert(specifier)
    }

    /// Add every specifier of another set
    pub fn extend(&mut self, other: &SpecifierSet) {
        self.specifiers.extend(other.specifiers.iter().cloned());
    }

    /// Check if a version satisfies every specifier
    pub fn contains(&self, candidate: &Version) -> bool {
        self.specifiers.iter().all(|spec| spec.contains(candidate))
    }

    /// The pinned version when the set is a single `==` specifier
    pub fn exact_pin(&self) -> Option<&Version> {
        match self.specifiers.len() {
            1 => self.specifiers.iter().next().and_then(Specifier::exact_version),
            _ => None,
        }
    }
}

impl FromStr for SpecifierSet {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = SpecifierSet::new();
        if s.trim().is_empty() {
            return Ok(set);
        }
        for part in s.split(',') {
            set.insert(part.parse()?);
        }
        Ok(set)
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.specifiers.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}

impl FromIterator<Specifier> for SpecifierSet {
    fn from_iter<I: IntoIterator<Item = Specifier>>(iter: I) -> Self {
        Self {
            specifiers: iter.into_iter().collect(),
        }
    }
}

impl Serialize for SpecifierSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpecifierSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
