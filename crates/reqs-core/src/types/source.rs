//! Direct sources: version-control references and archive URLs.
//!
//! A version-control reference looks like
//! `git+https://github.com/org/repo@<revision>#egg=<name>&subdirectory=<dir>`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Where a requirement is fetched from instead of the package index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Vcs(VcsReference),
    Url(Url),
}

/// Version control system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
    Bzr,
}

/// Source-control reference with optional revision
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VcsReference {
    pub kind: VcsKind,
    /// Transport URL with revision and fragment removed
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdirectory: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Unknown version control system '{scheme}'")]
    UnknownVcs { scheme: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported transport '{scheme}' in '{url}'")]
    UnsupportedTransport { scheme: String, url: String },

    #[error("Empty revision after '@' in '{url}'")]
    EmptyRevision { url: String },
}

const VCS_TRANSPORTS: [&str; 6] = ["https", "http", "ssh", "git", "file", "svn"];
const ARCHIVE_SCHEMES: [&str; 3] = ["https", "http", "file"];

impl VcsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Hg => "hg",
            VcsKind::Svn => "svn",
            VcsKind::Bzr => "bzr",
        }
    }
}

impl FromStr for VcsKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "git" => Ok(VcsKind::Git),
            "hg" => Ok(VcsKind::Hg),
            "svn" => Ok(VcsKind::Svn),
            "bzr" => Ok(VcsKind::Bzr),
            _ => Err(SourceError::UnknownVcs {
                scheme: s.to_string(),
            }),
        }
    }
}

impl VcsReference {
    /// Parse a `vcs+transport://...` reference
    pub fn parse(input: &str) -> Result<Self, SourceError> {
        let input = input.trim();
        let (scheme, rest) = input.split_once('+').ok_or_else(|| SourceError::UnknownVcs {
            scheme: input.split("://").next().unwrap_or(input).to_string(),
        })?;
        let kind: VcsKind = scheme.parse()?;

        let (location, fragment) = match rest.split_once('#') {
            Some((location, fragment)) => (location, Some(fragment)),
            None => (rest, None),
        };

        let mut url = Url::parse(location).map_err(|e| SourceError::InvalidUrl {
            url: input.to_string(),
            reason: e.to_string(),
        })?;
        if !VCS_TRANSPORTS.contains(&url.scheme()) {
            return Err(SourceError::UnsupportedTransport {
                scheme: url.scheme().to_string(),
                url: input.to_string(),
            });
        }

        let revision = match url.path().rsplit_once('@') {
            Some((_, "")) => {
                return Err(SourceError::EmptyRevision {
                    url: input.to_string(),
                })
            },
            Some((path, revision)) => {
                let (path, revision) = (path.to_string(), revision.to_string());
                url.set_path(&path);
                Some(revision)
            },
            None => None,
        };

        let mut egg = None;
        let mut subdirectory = None;
        for pair in fragment.unwrap_or_default().split('&') {
            match pair.split_once('=') {
                Some(("egg", value)) if !value.is_empty() => egg = Some(value.to_string()),
                Some(("subdirectory", value)) if !value.is_empty() => {
                    subdirectory = Some(value.to_string())
                },
                _ => {},
            }
        }

        Ok(Self {
            kind,
            url,
            revision,
            egg,
            subdirectory,
        })
    }

    /// Check if the reference pins an exact commit rather than a branch or tag
    ///
    /// Git and Mercurial need a full 40 (SHA-1) or 64 (SHA-256) hex digit id;
    /// Subversion revisions are plain numbers.
    pub fn is_pinned_to_full_revision(&self) -> bool {
        let Some(revision) = self.revision.as_deref() else {
            return false;
        };
        match self.kind {
            VcsKind::Svn => {
                let digits = revision.strip_prefix('r').unwrap_or(revision);
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            },
            _ => {
                matches!(revision.len(), 40 | 64) && revision.bytes().all(|b| b.is_ascii_hexdigit())
            },
        }
    }

    /// Package name from `#egg=`, else the repository name
    pub fn derived_name(&self) -> Option<String> {
        if let Some(egg) = &self.egg {
            return Some(egg.clone());
        }
        let last = self
            .url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()?;
        let name = last.strip_suffix(".git").unwrap_or(last);
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Plain-text transports (`http://`, `git://`)
    pub fn is_insecure(&self) -> bool {
        matches!(self.url.scheme(), "http" | "git")
    }
}

impl fmt::Display for VcsReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.kind.as_str(), self.url)?;
        if let Some(ref revision) = self.revision {
            write!(f, "@{}", revision)?;
        }

        let mut fragment = Vec::new();
        if let Some(ref egg) = self.egg {
            fragment.push(format!("egg={}", egg));
        }
        if let Some(ref subdirectory) = self.subdirectory {
            fragment.push(format!("subdirectory={}", subdirectory));
        }
        if !fragment.is_empty() {
            write!(f, "#{}", fragment.join("&"))?;
        }

        Ok(())
    }
}

impl Source {
    /// Parse a VCS reference or archive URL
    pub fn parse(input: &str) -> Result<Self, SourceError> {
        let input = input.trim();
        let scheme = input.split("://").next().unwrap_or_default();
        if scheme.contains('+') {
            return VcsReference::parse(input).map(Source::Vcs);
        }

        let url = Url::parse(input).map_err(|e| SourceError::InvalidUrl {
            url: input.to_string(),
            reason: e.to_string(),
        })?;
        if !ARCHIVE_SCHEMES.contains(&url.scheme()) {
            return Err(SourceError::UnsupportedTransport {
                scheme: url.scheme().to_string(),
                url: input.to_string(),
            });
        }
        Ok(Source::Url(url))
    }

    /// Package name implied by the source itself
    pub fn derived_name(&self) -> Option<String> {
        match self {
            Source::Vcs(vcs) => vcs.derived_name(),
            Source::Url(url) => {
                let egg = url.fragment().and_then(|fragment| {
                    fragment
                        .split('&')
                        .find_map(|pair| pair.strip_prefix("egg="))
                        .filter(|egg| !egg.is_empty())
                });
                if let Some(egg) = egg {
                    return Some(egg.to_string());
                }
                let file = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
                name_from_archive(file)
            },
        }
    }

    pub fn as_vcs(&self) -> Option<&VcsReference> {
        match self {
            Source::Vcs(vcs) => Some(vcs),
            Source::Url(_) => None,
        }
    }

    pub fn is_insecure(&self) -> bool {
        match self {
            Source::Vcs(vcs) => vcs.is_insecure(),
            Source::Url(url) => url.scheme() == "http",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Vcs(vcs) => vcs.fmt(f),
            Source::Url(url) => f.write_str(url.as_str()),
        }
    }
}

/// Distribution name from a wheel or sdist file name
fn name_from_archive(file: &str) -> Option<String> {
    if let Some(stem) = file.strip_suffix(".whl") {
        return stem.split('-').next().filter(|s| !s.is_empty()).map(str::to_string);
    }

    let stem = [".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".zip"]
        .iter()
        .find_map(|ext| file.strip_suffix(ext))?;

    // name runs up to the first '-' that starts the version
    let bytes = stem.as_bytes();
    let split = (0..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'-' && bytes[i + 1].is_ascii_digit())?;
    Some(stem[..split].to_string())
}
