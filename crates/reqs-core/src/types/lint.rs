//! Lint rule identifiers and levels.
//!
//! Shared by the configuration layer (which sets levels) and the checker
//! (which reports findings under a rule).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Structural rule a manifest can violate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// Same package declared with constraints no version can satisfy
    ConflictingConstraints,
    /// Same package declared more than once
    DuplicateDeclaration,
    /// VCS reference without a full commit id
    FloatingRevision,
    /// Bare package name with no specifier or source
    Unpinned,
    /// Some requirements carry `--hash`, others do not
    PartialHashes,
    /// Plain-text transport (`http://`, `git://`)
    InsecureTransport,
}

/// How a finding under a rule is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Allow,
    Warn,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

impl RuleId {
    pub const ALL: [RuleId; 6] = [
        RuleId::ConflictingConstraints,
        RuleId::DuplicateDeclaration,
        RuleId::FloatingRevision,
        RuleId::Unpinned,
        RuleId::PartialHashes,
        RuleId::InsecureTransport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::ConflictingConstraints => "conflicting-constraints",
            RuleId::DuplicateDeclaration => "duplicate-declaration",
            RuleId::FloatingRevision => "floating-revision",
            RuleId::Unpinned => "unpinned",
            RuleId::PartialHashes => "partial-hashes",
            RuleId::InsecureTransport => "insecure-transport",
        }
    }

    /// Level used when nothing is configured
    pub fn default_level(&self) -> Level {
        match self {
            RuleId::ConflictingConstraints | RuleId::FloatingRevision => Level::Deny,
            RuleId::DuplicateDeclaration | RuleId::PartialHashes | RuleId::InsecureTransport => {
                Level::Warn
            },
            RuleId::Unpinned => Level::Allow,
        }
    }

    /// Environment variable overriding this rule's level
    pub fn env_key(&self) -> String {
        format!("REQS_LINT_{}", self.as_str().replace('-', "_").to_uppercase())
    }
}

impl FromStr for RuleId {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        RuleId::ALL
            .into_iter()
            .find(|rule| rule.as_str() == wanted)
            .ok_or_else(|| UnknownName {
                kind: "lint rule",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Level::Allow),
            "warn" => Ok(Level::Warn),
            "deny" => Ok(Level::Deny),
            _ => Err(UnknownName {
                kind: "lint level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Level::Allow => "allow",
            Level::Warn => "warn",
            Level::Deny => "deny",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_round_trip() {
        for rule in RuleId::ALL {
            assert_eq!(rule.as_str().parse::<RuleId>().unwrap(), rule);
        }
        assert_eq!("FLOATING_REVISION".parse::<RuleId>().unwrap(), RuleId::FloatingRevision);
        assert!("no-such-rule".parse::<RuleId>().is_err());
    }

    #[test]
    fn test_env_key() {
        assert_eq!(RuleId::FloatingRevision.env_key(), "REQS_LINT_FLOATING_REVISION");
    }

    #[test]
    fn test_levels() {
        assert_eq!("Deny".parse::<Level>().unwrap(), Level::Deny);
        assert!("error".parse::<Level>().is_err());
        assert!(Level::Deny > Level::Warn);
        assert_eq!(RuleId::Unpinned.default_level(), Level::Allow);
    }
}
