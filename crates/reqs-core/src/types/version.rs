//! PEP 440 version type.
//!
//! Parses the full public version grammar (epoch, release, pre, post and dev
//! segments) plus local labels, normalizes alternate spellings, and orders
//! versions the way Python packaging tools do.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version (`[N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]`)
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreKind, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    /// Normalized local label, segments joined with `.`
    pub local: Option<String>,
}

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

/// Version parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: {component}")]
    InvalidNumber { component: String },

    #[error("Invalid local version label: {local}")]
    InvalidLocal { local: String },
}

impl Version {
    /// Create a final release version from its release segments
    pub fn new(release: &[u64]) -> Self {
        Self {
            epoch: 0,
            release: release.to_vec(),
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Check if this is a pre-release (including dev releases)
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Check if this is a post-release
    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// Same version with the local label removed
    pub fn without_local(&self) -> Self {
        Self {
            local: None,
            ..self.clone()
        }
    }

    /// Epoch and release segments only
    pub fn base(&self) -> Self {
        Self {
            epoch: self.epoch,
            release: self.release.clone(),
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Lowest version sharing the given release prefix (`1.2` -> `1.2.dev0`)
    pub fn prefix_floor(&self, len: usize) -> Self {
        Self {
            epoch: self.epoch,
            release: self.release.iter().copied().take(len.max(1)).collect(),
            pre: None,
            post: None,
            dev: Some(0),
            local: None,
        }
    }

    /// First version past the given release prefix (`1.2` -> `1.3.dev0`)
    pub fn prefix_ceiling(&self, len: usize) -> Self {
        let mut floor = self.prefix_floor(len);
        while floor.release.len() < len.max(1) {
            floor.release.push(0);
        }
        if let Some(last) = floor.release.last_mut() {
            *last += 1;
        }
        floor
    }

    /// Release segments with trailing zeros removed (`1.0.0` compares as `1`)
    fn release_key(&self) -> &[u64] {
        let mut end = self.release.len();
        while end > 0 && self.release[end - 1] == 0 {
            end -= 1;
        }
        &self.release[..end]
    }

    fn phase_key(&self) -> PhaseKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PhaseKey::DevOnly,
            (Some((kind, n)), _, _) => PhaseKey::Pre(kind, n),
            _ => PhaseKey::Final,
        }
    }

    fn dev_key(&self) -> DevKey {
        match self.dev {
            Some(n) => DevKey::Dev(n),
            None => DevKey::Release,
        }
    }

    fn local_key(&self) -> Option<Vec<LocalSegment>> {
        self.local.as_ref().map(|local| {
            local
                .split('.')
                .map(|segment| match segment.parse::<u64>() {
                    Ok(n) => LocalSegment::Numeric(n),
                    Err(_) => LocalSegment::Alpha(segment.to_string()),
                })
                .collect()
        })
    }
}

// dev-only releases sort before pre-releases of the same release
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum PhaseKey {
    DevOnly,
    Pre(PreKind, u64),
    Final,
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    Release,
}

// numeric local segments sort after alphanumeric ones
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum LocalSegment {
    Alpha(String),
    Numeric(u64),
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.release_key().cmp(other.release_key()))
            .then_with(|| self.phase_key().cmp(&other.phase_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local_key().cmp(&other.local_key()))
    }
}

/// Byte cursor over a lowercased version string
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_separator(&mut self) -> bool {
        match self.peek() {
            Some(b'-' | b'_' | b'.') => {
                self.pos += 1;
                true
            },
            _ => false,
        }
    }

    fn digits(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.input[start..self.pos])
    }
}

fn number(component: &str) -> Result<u64, VersionError> {
    component.parse().map_err(|_| VersionError::InvalidNumber {
        component: component.to_string(),
    })
}

fn parse_pre(cursor: &mut Cursor<'_>) -> Result<Option<(PreKind, u64)>, VersionError> {
    const LABELS: [(&str, PreKind); 8] = [
        ("preview", PreKind::Rc),
        ("alpha", PreKind::Alpha),
        ("beta", PreKind::Beta),
        ("pre", PreKind::Rc),
        ("rc", PreKind::Rc),
        ("a", PreKind::Alpha),
        ("b", PreKind::Beta),
        ("c", PreKind::Rc),
    ];

    let start = cursor.pos;
    cursor.eat_separator();
    for (label, kind) in LABELS {
        if cursor.eat(label) {
            cursor.eat_separator();
            let n = match cursor.digits() {
                Some(digits) => number(digits)?,
                None => 0,
            };
            return Ok(Some((kind, n)));
        }
    }
    cursor.pos = start;
    Ok(None)
}

fn parse_post(cursor: &mut Cursor<'_>) -> Result<Option<u64>, VersionError> {
    let start = cursor.pos;

    // implicit form: 1.0-1
    if cursor.peek() == Some(b'-') && cursor.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
        cursor.pos += 1;
        if let Some(digits) = cursor.digits() {
            return Ok(Some(number(digits)?));
        }
    }
    cursor.pos = start;

    cursor.eat_separator();
    for label in ["post", "rev", "r"] {
        if cursor.eat(label) {
            cursor.eat_separator();
            let n = match cursor.digits() {
                Some(digits) => number(digits)?,
                None => 0,
            };
            return Ok(Some(n));
        }
    }
    cursor.pos = start;
    Ok(None)
}

fn parse_dev(cursor: &mut Cursor<'_>) -> Result<Option<u64>, VersionError> {
    let start = cursor.pos;
    cursor.eat_separator();
    if cursor.eat("dev") {
        cursor.eat_separator();
        let n = match cursor.digits() {
            Some(digits) => number(digits)?,
            None => 0,
        };
        return Ok(Some(n));
    }
    cursor.pos = start;
    Ok(None)
}

fn parse_local(local: &str) -> Result<String, VersionError> {
    let segments: Vec<&str> = local.split(['-', '_', '.']).collect();
    let valid = segments
        .iter()
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()));
    if !valid {
        return Err(VersionError::InvalidLocal {
            local: local.to_string(),
        });
    }
    Ok(segments.join("."))
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || VersionError::InvalidFormat {
            input: input.to_string(),
        };

        let lowered = input.to_ascii_lowercase();
        let (public, local) = match lowered.split_once('+') {
            Some((public, local)) => (public, Some(parse_local(local)?)),
            None => (lowered.as_str(), None),
        };
        let public = public.strip_prefix('v').unwrap_or(public);

        let mut cursor = Cursor::new(public);
        let first = cursor.digits().ok_or_else(invalid)?;

        let mut epoch = 0;
        let mut release = Vec::new();
        if cursor.eat("!") {
            epoch = number(first)?;
            release.push(number(cursor.digits().ok_or_else(invalid)?)?);
        } else {
            release.push(number(first)?);
        }

        while cursor.peek() == Some(b'.') && cursor.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            cursor.pos += 1;
            release.push(number(cursor.digits().ok_or_else(invalid)?)?);
        }

        let pre = parse_pre(&mut cursor)?;
        let post = parse_post(&mut cursor)?;
        let dev = parse_dev(&mut cursor)?;

        if !cursor.is_done() {
            return Err(invalid());
        }

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }
}

impl fmt::Display for PreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::Rc => "rc",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }

        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;

        if let Some((kind, n)) = self.pre {
            write!(f, "{}{}", kind, n)?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{}", post)?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{}", dev)?;
        }
        if let Some(ref local) = self.local {
            write!(f, "+{}", local)?;
        }

        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::from_str(text).unwrap()
    }

    #[test]
    fn test_version_parsing() {
        let version = v("6.74.0");
        assert_eq!(version.epoch, 0);
        assert_eq!(version.release, vec![6, 74, 0]);
        assert_eq!(version.pre, None);
        assert_eq!(version.post, None);
        assert_eq!(version.dev, None);
        assert_eq!(version.local, None);
    }

    #[test]
    fn test_full_grammar() {
        let version = v("2!1.0rc2.post3.dev4+ubuntu-1");
        assert_eq!(version.epoch, 2);
        assert_eq!(version.release, vec![1, 0]);
        assert_eq!(version.pre, Some((PreKind::Rc, 2)));
        assert_eq!(version.post, Some(3));
        assert_eq!(version.dev, Some(4));
        assert_eq!(version.local.as_deref(), Some("ubuntu.1"));
    }

    #[test]
    fn test_alternate_spellings_normalize() {
        assert_eq!(v("1.0-alpha.1").to_string(), "1.0a1");
        assert_eq!(v("1.0.PREVIEW2").to_string(), "1.0rc2");
        assert_eq!(v("1.0c1").to_string(), "1.0rc1");
        assert_eq!(v("1.0-1").to_string(), "1.0.post1");
        assert_eq!(v("1.0.rev").to_string(), "1.0.post0");
        assert_eq!(v("v1.0-dev").to_string(), "1.0.dev0");
        assert_eq!(v("1.0b").to_string(), "1.0b0");
    }

    #[test]
    fn test_invalid_versions() {
        for input in ["", "abc", "1.0.", "1..0", "1.0foo", "1.0+", "1.0+a..b", "1!"] {
            assert!(Version::from_str(input).is_err(), "expected error for {input:?}");
        }
    }

    #[test]
    fn test_number_overflow() {
        let err = Version::from_str("99999999999999999999999.0").unwrap_err();
        assert!(matches!(err, VersionError::InvalidNumber { .. }));
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_phase_ordering() {
        let ordered = [
            "1.0.dev0",
            "1.0a1.dev1",
            "1.0a1",
            "1.0a2",
            "1.0b1",
            "1.0rc1",
            "1.0",
            "1.0+local",
            "1.0.post1.dev0",
            "1.0.post1",
            "1.1.dev0",
            "1!0.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_local_segment_ordering() {
        assert!(v("1.0+abc") < v("1.0+1"));
        assert!(v("1.0+1") < v("1.0+2"));
        assert!(v("1.0+1") < v("1.0+1.1"));
    }

    #[test]
    fn test_prefix_bounds() {
        let version = v("1.4.2");
        assert_eq!(version.prefix_floor(2).to_string(), "1.4.dev0");
        assert_eq!(version.prefix_ceiling(2).to_string(), "1.5.dev0");
        assert_eq!(v("3").prefix_ceiling(2).to_string(), "3.1.dev0");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("0.3.10")).unwrap();
        assert_eq!(json, "\"0.3.10\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("0.3.10"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn version_strategy() -> impl Strategy<Value = Version> {
        (
            prop_oneof![Just(0u64), 0u64..5],
            prop::collection::vec(0u64..1000, 1..5),
            prop::option::of((
                prop_oneof![Just(PreKind::Alpha), Just(PreKind::Beta), Just(PreKind::Rc)],
                0u64..20,
            )),
            prop::option::of(0u64..20),
            prop::option::of(0u64..20),
            prop::option::of("[a-z0-9]{1,6}(\\.[a-z0-9]{1,6}){0,2}"),
        )
            .prop_map(|(epoch, release, pre, post, dev, local)| Version {
                epoch,
                release,
                pre,
                post,
                dev,
                local,
            })
    }

    proptest! {
        #[test]
        fn version_round_trip(original in version_strategy()) {
            let rendered = original.to_string();
            let parsed = Version::from_str(&rendered).unwrap();

            prop_assert_eq!(&parsed, &original);
            prop_assert_eq!(parsed.to_string(), rendered);
        }

        #[test]
        fn version_comparison_transitivity(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            if a < b && b < c {
                prop_assert!(a < c, "Transitivity violated: {} < {} < {}", a, b, c);
            }
            if a > b && b > c {
                prop_assert!(a > c, "Transitivity violated: {} > {} > {}", a, b, c);
            }
        }
    }
}
