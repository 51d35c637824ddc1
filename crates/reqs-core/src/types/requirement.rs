//! Requirement declarations.
//!
//! A requirement is one declaration line of a manifest: a package name with
//! optional extras and specifiers, or a direct source reference, optionally
//! guarded by an environment marker.

use super::name::{NameError, PackageName};
use super::source::{Source, SourceError, VcsReference};
use super::specifier::{SpecifierError, SpecifierSet};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Parsed requirement declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: PackageName,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub extras: BTreeSet<String>,
    #[serde(skip_serializing_if = "SpecifierSet::is_empty")]
    pub specifiers: SpecifierSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// Environment marker text, whitespace-collapsed, never evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<HashDigest>,
    pub editable: bool,
    /// Written as a bare URL with the name derived from it
    #[serde(skip)]
    pub bare_url: bool,
}

/// Digest from a `--hash=algo:hex` option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashDigest {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("Empty requirement")]
    Empty,

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("Invalid extras in '{input}'")]
    InvalidExtras { input: String },

    #[error(transparent)]
    Specifier(#[from] SpecifierError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Cannot derive a package name from '{url}'; add '#egg=<name>' or write 'name @ url'")]
    NameNotDerivable { url: String },

    #[error("Unexpected '{found}' after package name '{name}'")]
    UnexpectedCharacter { name: String, found: char },

    #[error("Empty environment marker in '{input}'")]
    EmptyMarker { input: String },

    #[error("Invalid hash '{input}': {reason}")]
    InvalidHash { input: String, reason: String },
}

impl Requirement {
    /// Requirement on a name with no constraint
    pub fn named(name: PackageName) -> Self {
        Self {
            name,
            extras: BTreeSet::new(),
            specifiers: SpecifierSet::new(),
            source: None,
            marker: None,
            hashes: Vec::new(),
            editable: false,
            bare_url: false,
        }
    }

    /// Version constraint text (`==6.74.0`), if any
    pub fn constraint(&self) -> Option<String> {
        (!self.specifiers.is_empty()).then(|| self.specifiers.to_string())
    }

    /// Source-control reference, if the requirement has one
    pub fn vcs(&self) -> Option<&VcsReference> {
        self.source.as_ref().and_then(Source::as_vcs)
    }

    /// Source-control revision, if the requirement has one
    pub fn revision(&self) -> Option<&str> {
        self.vcs().and_then(|vcs| vcs.revision.as_deref())
    }

    /// No specifier and no direct source
    pub fn is_unpinned(&self) -> bool {
        self.specifiers.is_empty() && self.source.is_none()
    }

    /// Parse a requirement that came after `-e`
    pub fn parse_editable(input: &str) -> Result<Self, RequirementError> {
        let mut requirement: Requirement = input.parse()?;
        requirement.editable = true;
        Ok(requirement)
    }

    fn from_url(text: &str) -> Result<Self, RequirementError> {
        let (location, marker) = split_url_marker(text)?;
        let source = Source::parse(location)?;
        let name = source
            .derived_name()
            .ok_or_else(|| RequirementError::NameNotDerivable {
                url: location.to_string(),
            })?;

        let mut requirement = Requirement::named(PackageName::new(name)?);
        requirement.source = Some(source);
        requirement.marker = marker;
        requirement.bare_url = true;
        Ok(requirement)
    }
}

/// Check if text starts with `scheme://` rather than a package name
fn looks_like_url(text: &str) -> bool {
    text.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// URL markers must be separated by whitespace: `url ; marker`
fn split_url_marker(text: &str) -> Result<(&str, Option<String>), RequirementError> {
    let split = text
        .char_indices()
        .find(|&(i, c)| c == ';' && text[..i].ends_with(char::is_whitespace));
    match split {
        Some((i, _)) => Ok((text[..i].trim(), Some(parse_marker(text, &text[i + 1..])?))),
        None => Ok((text.trim(), None)),
    }
}

fn parse_marker(input: &str, marker: &str) -> Result<String, RequirementError> {
    let collapsed = marker.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(RequirementError::EmptyMarker {
            input: input.to_string(),
        });
    }
    Ok(collapsed)
}

fn parse_extras(input: &str, extras: &str) -> Result<BTreeSet<String>, RequirementError> {
    let mut parsed = BTreeSet::new();
    for extra in extras.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if !PackageName::is_valid(extra) {
            return Err(RequirementError::InvalidExtras {
                input: input.to_string(),
            });
        }
        parsed.insert(PackageName::normalize(extra));
    }
    Ok(parsed)
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(RequirementError::Empty);
        }
        if looks_like_url(input) {
            return Self::from_url(input);
        }

        let name_end = input
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(input.len());
        let name = PackageName::new(&input[..name_end])?;
        let mut rest = input[name_end..].trim_start();

        let mut requirement = Requirement::named(name);

        if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']').ok_or_else(|| RequirementError::InvalidExtras {
                input: input.to_string(),
            })?;
            requirement.extras = parse_extras(input, &after[..close])?;
            rest = after[close + 1..].trim_start();
        }

        if let Some(location) = rest.strip_prefix('@') {
            let (location, marker) = split_url_marker(location)?;
            requirement.source = Some(Source::parse(location)?);
            requirement.marker = marker;
            return Ok(requirement);
        }

        match rest.chars().next() {
            None | Some(';' | '(' | '=' | '!' | '<' | '>' | '~') => {},
            Some(found) => {
                return Err(RequirementError::UnexpectedCharacter {
                    name: requirement.name.to_string(),
                    found,
                })
            },
        }

        let (specs, marker) = match rest.split_once(';') {
            Some((specs, marker)) => (specs, Some(parse_marker(input, marker)?)),
            None => (rest, None),
        };
        let specs = specs.trim();
        let specs = specs
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(specs);

        requirement.specifiers = specs.parse()?;
        requirement.marker = marker;
        Ok(requirement)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.editable {
            f.write_str("-e ")?;
        }

        match &self.source {
            Some(source) if self.bare_url || self.editable => write!(f, "{}", source)?,
            Some(source) => {
                write!(f, "{}", self.name)?;
                write_extras(f, &self.extras)?;
                write!(f, " @ {}", source)?;
            },
            None => {
                write!(f, "{}", self.name)?;
                write_extras(f, &self.extras)?;
                write!(f, "{}", self.specifiers)?;
            },
        }

        if let Some(ref marker) = self.marker {
            if self.source.is_some() {
                write!(f, " ; {}", marker)?;
            } else {
                write!(f, "; {}", marker)?;
            }
        }

        for hash in &self.hashes {
            write!(f, " --hash={}", hash)?;
        }

        Ok(())
    }
}

pub(crate) fn write_extras(f: &mut fmt::Formatter<'_>, extras: &BTreeSet<String>) -> fmt::Result {
    if extras.is_empty() {
        return Ok(());
    }
    let extras: Vec<&str> = extras.iter().map(String::as_str).collect();
    write!(f, "[{}]", extras.join(","))
}

impl HashAlgorithm {
    fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl FromStr for HashDigest {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason: &str| RequirementError::InvalidHash {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (algorithm, hex) = input
            .split_once(':')
            .ok_or_else(|| invalid("expected <algorithm>:<hex digest>"))?;
        let algorithm = match algorithm.to_ascii_lowercase().as_str() {
            "sha256" => HashAlgorithm::Sha256,
            "sha384" => HashAlgorithm::Sha384,
            "sha512" => HashAlgorithm::Sha512,
            _ => return Err(invalid("supported algorithms are sha256, sha384 and sha512")),
        };
        if hex.len() != algorithm.hex_len() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("digest length does not match the algorithm"));
        }

        Ok(Self {
            algorithm,
            hex: hex.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(text: &str) -> Requirement {
        text.parse().unwrap()
    }

    #[test]
    fn test_exact_pin() {
        let r = req("hypothesis==6.74.0");
        assert_eq!(r.name.as_str(), "hypothesis");
        assert_eq!(r.constraint().as_deref(), Some("==6.74.0"));
        assert!(r.source.is_none());
        assert_eq!(r.to_string(), "hypothesis==6.74.0");
    }

    #[test]
    fn test_lower_bound() {
        let r = req("vyper>=0.3.10");
        assert_eq!(r.name.as_str(), "vyper");
        assert_eq!(r.constraint().as_deref(), Some(">=0.3.10"));
    }

    #[test]
    fn test_bare_vcs_url() {
        let r = req("git+https://github.com/vyperlang/titanoboa@40e85c602aa2c15baaf5060547c1224178d9efae");
        assert_eq!(r.name.as_str(), "titanoboa");
        assert_eq!(r.revision(), Some("40e85c602aa2c15baaf5060547c1224178d9efae"));
        assert!(r.bare_url);
        assert_eq!(r.constraint(), None);
        assert_eq!(
            r.to_string(),
            "git+https://github.com/vyperlang/titanoboa@40e85c602aa2c15baaf5060547c1224178d9efae"
        );
    }

    #[test]
    fn test_bare_name() {
        let r = req("black");
        assert_eq!(r.name.as_str(), "black");
        assert!(r.is_unpinned());
        assert_eq!(r.constraint(), None);
    }

    #[test]
    fn test_extras_and_marker() {
        let r = req("Eth-Utils [ Crypto , dev ] >= 2.0 ; python_version  >= '3.8'");
        assert_eq!(r.name.normalized(), "eth-utils");
        assert_eq!(
            r.extras.iter().cloned().collect::<Vec<_>>(),
            vec!["crypto".to_string(), "dev".to_string()]
        );
        assert_eq!(r.marker.as_deref(), Some("python_version >= '3.8'"));
        assert_eq!(r.to_string(), "Eth-Utils[crypto,dev]>=2.0; python_version >= '3.8'");
    }

    #[test]
    fn test_parenthesized_specifiers() {
        let r = req("pandas (>=1.5,<3)");
        assert_eq!(r.constraint().as_deref(), Some(">=1.5,<3"));
    }

    #[test]
    fn test_direct_reference() {
        let r = req("boa @ git+https://github.com/vyperlang/titanoboa@v0.1.8 ; sys_platform == 'linux'");
        assert_eq!(r.name.as_str(), "boa");
        assert!(!r.bare_url);
        assert_eq!(r.revision(), Some("v0.1.8"));
        assert_eq!(r.marker.as_deref(), Some("sys_platform == 'linux'"));
        assert_eq!(
            r.to_string(),
            "boa @ git+https://github.com/vyperlang/titanoboa@v0.1.8 ; sys_platform == 'linux'"
        );
    }

    #[test]
    fn test_editable() {
        let r = Requirement::parse_editable("git+https://github.com/org/tool@main#egg=tool").unwrap();
        assert!(r.editable);
        assert_eq!(r.name.as_str(), "tool");
        assert_eq!(r.to_string(), "-e git+https://github.com/org/tool@main#egg=tool");
    }

    #[test]
    fn test_requirement_errors() {
        assert_eq!("".parse::<Requirement>(), Err(RequirementError::Empty));
        assert!(matches!(
            "foo$bar".parse::<Requirement>(),
            Err(RequirementError::UnexpectedCharacter { found: '$', .. })
        ));
        assert!(matches!(
            "foo 1.0".parse::<Requirement>(),
            Err(RequirementError::UnexpectedCharacter { found: '1', .. })
        ));
        assert!(matches!(
            "foo[bar".parse::<Requirement>(),
            Err(RequirementError::InvalidExtras { .. })
        ));
        assert!(matches!(
            "foo>=1;".parse::<Requirement>(),
            Err(RequirementError::EmptyMarker { .. })
        ));
        assert!(matches!(
            "https://example.org/download".parse::<Requirement>(),
            Err(RequirementError::NameNotDerivable { .. })
        ));
        assert!(matches!(
            "=>1.0".parse::<Requirement>(),
            Err(RequirementError::Name(_))
        ));
    }

    #[test]
    fn test_hash_digest() {
        let hex = "a".repeat(64);
        let digest: HashDigest = format!("sha256:{}", hex).parse().unwrap();
        assert_eq!(digest.algorithm, HashAlgorithm::Sha256);
        assert_eq!(digest.to_string(), format!("sha256:{}", hex));

        assert!("md5:abcd".parse::<HashDigest>().is_err());
        assert!("sha256:abcd".parse::<HashDigest>().is_err());
        assert!("sha256".parse::<HashDigest>().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(req("hypothesis==6.74.0")).unwrap();
        assert_eq!(json["name"], "hypothesis");
        assert_eq!(json["specifiers"], "==6.74.0");
        assert!(json.get("source").is_none());
    }
}
