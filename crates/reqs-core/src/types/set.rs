//! The dependency set a manifest declares.
//!
//! Declarations are keyed by normalized package name (and environment marker,
//! when one is present). Order is not significant: two sets are equal when
//! they hold the same declarations, however the lines were arranged.

use super::name::PackageName;
use super::requirement::{write_extras, Requirement};
use super::source::Source;
use super::specifier::SpecifierSet;
use crate::error::{ReqsError, ReqsResult};
use crate::utils::hash::blake3_hex;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Identity of a declaration inside a set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclarationKey {
    pub name: PackageName,
    pub marker: Option<String>,
}

/// Merged declaration for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: PackageName,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub extras: BTreeSet<String>,
    #[serde(skip_serializing_if = "SpecifierSet::is_empty")]
    pub specifiers: SpecifierSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    pub editable: bool,
}

/// Set of declarations keyed by package name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    entries: IndexMap<DeclarationKey, Declaration>,
}

impl From<&Requirement> for Declaration {
    fn from(requirement: &Requirement) -> Self {
        Self {
            name: requirement.name.clone(),
            extras: requirement.extras.clone(),
            specifiers: requirement.specifiers.clone(),
            source: requirement.source.clone(),
            marker: requirement.marker.clone(),
            editable: requirement.editable,
        }
    }
}

impl Declaration {
    pub fn key(&self) -> DeclarationKey {
        DeclarationKey {
            name: self.name.clone(),
            marker: self.marker.clone(),
        }
    }

    /// Fold another declaration of the same key into this one
    pub fn merge(&mut self, other: Declaration) -> ReqsResult<()> {
        if let (Some(first), Some(second)) = (&self.source, &other.source) {
            if first != second {
                return Err(ReqsError::SourceConflict {
                    package: self.name.to_string(),
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
        if self.source.is_none() {
            self.source = other.source;
        }

        self.extras.extend(other.extras);
        self.specifiers.extend(&other.specifiers);
        self.editable |= other.editable;
        Ok(())
    }

    /// Canonical manifest lines for this declaration
    ///
    /// A source and a version constraint cannot share one line, so a
    /// declaration carrying both renders as the source line followed by
    /// a `name<specifiers>` line.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let marker = |separator: &str| {
            self.marker
                .as_ref()
                .map(|m| format!("{}{}", separator, m))
                .unwrap_or_default()
        };

        match &self.source {
            Some(source) if self.editable => {
                lines.push(format!("-e {}{}", source, marker(" ; ")));
            },
            Some(source) => {
                lines.push(format!("{} @ {}{}", self.display_name(), source, marker(" ; ")));
            },
            None => {},
        }

        // `-e` lines cannot carry extras
        let editable_extras = self.editable && !self.extras.is_empty();
        if self.source.is_none() || !self.specifiers.is_empty() || editable_extras {
            lines.push(format!("{}{}{}", self.display_name(), self.specifiers, marker("; ")));
        }

        lines
    }

    fn display_name(&self) -> String {
        DisplayName(self).to_string()
    }
}

struct DisplayName<'a>(&'a Declaration);

impl fmt::Display for DisplayName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)?;
        write_extras(f, &self.0.extras)
    }
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a requirement, merging with an existing declaration of the same key
    pub fn insert(&mut self, requirement: &Requirement) -> ReqsResult<()> {
        self.insert_declaration(Declaration::from(requirement))
    }

    pub fn insert_declaration(&mut self, declaration: Declaration) -> ReqsResult<()> {
        match self.entries.get_mut(&declaration.key()) {
            Some(existing) => existing.merge(declaration),
            None => {
                self.entries.insert(declaration.key(), declaration);
                Ok(())
            },
        }
    }

    /// Build a set from requirements, merging duplicates
    pub fn from_requirements<'a, I>(requirements: I) -> ReqsResult<Self>
    where
        I: IntoIterator<Item = &'a Requirement>,
    {
        let mut set = Self::new();
        for requirement in requirements {
            set.insert(requirement)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declarations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.entries.values()
    }

    /// All declarations for a name, regardless of marker
    pub fn get_all(&self, name: &str) -> Vec<&Declaration> {
        let normalized = PackageName::normalize(name);
        self.entries
            .values()
            .filter(|d| d.name.normalized() == normalized)
            .collect()
    }

    /// Declaration for a name without marker, or the first one with a marker
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        let declarations = self.get_all(name);
        declarations
            .iter()
            .find(|d| d.marker.is_none())
            .or_else(|| declarations.first())
            .copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    /// Normalized names of every declaration
    pub fn names(&self) -> BTreeSet<String> {
        self.entries
            .keys()
            .map(|k| k.name.normalized().to_string())
            .collect()
    }

    /// Declarations sorted by key
    pub fn sorted(&self) -> Vec<&Declaration> {
        let mut declarations: Vec<&Declaration> = self.entries.values().collect();
        declarations.sort_by_key(|d| d.key());
        declarations
    }

    /// Comment-free canonical manifest text, one declaration per line
    pub fn to_requirements(&self) -> String {
        let mut out = String::new();
        for declaration in self.sorted() {
            for line in declaration.to_lines() {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// Stable digest of the canonical text
    pub fn fingerprint(&self) -> String {
        blake3_hex(self.to_requirements().as_bytes())
    }
}

impl Serialize for DependencySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.sorted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(text: &str) -> Requirement {
        text.parse().unwrap()
    }

    const BOA: &str =
        "git+https://github.com/vyperlang/titanoboa@40e85c602aa2c15baaf5060547c1224178d9efae";

    #[test]
    fn test_duplicates_merge() {
        let set = DependencySet::from_requirements(&[req("pandas>=1.5"), req("Pandas<3")]).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("pandas").unwrap().specifiers.to_string(), ">=1.5,<3");
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = DependencySet::from_requirements(&[req("black"), req("vyper>=0.3.10")]).unwrap();
        let b = DependencySet::from_requirements(&[req("vyper>=0.3.10"), req("black")]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_source_with_secondary_constraint() {
        let set = DependencySet::from_requirements(&[req(BOA), req("titanoboa>=0.1")]).unwrap();
        assert_eq!(set.len(), 1);
        let declaration = set.get("titanoboa").unwrap();
        assert!(declaration.source.is_some());
        assert_eq!(
            declaration.to_lines(),
            vec![format!("titanoboa @ {}", BOA), "titanoboa>=0.1".to_string()]
        );
    }

    #[test]
    fn test_conflicting_sources() {
        let result = DependencySet::from_requirements(&[
            req(BOA),
            req("titanoboa @ git+https://github.com/fork/titanoboa@main"),
        ]);
        assert!(matches!(result, Err(ReqsError::SourceConflict { .. })));
    }

    #[test]
    fn test_markers_are_separate_keys() {
        let set = DependencySet::from_requirements(&[
            req("numpy<2; python_version < '3.9'"),
            req("numpy>=2; python_version >= '3.9'"),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_all("numpy").len(), 2);
        assert!(set.contains_name("NumPy"));
    }

    #[test]
    fn test_to_requirements_is_sorted() {
        let set = DependencySet::from_requirements(&[
            req("vyper>=0.3.10"),
            req("hypothesis==6.74.0"),
            req("black"),
        ])
        .unwrap();
        assert_eq!(set.to_requirements(), "black\nhypothesis==6.74.0\nvyper>=0.3.10\n");
    }
}
