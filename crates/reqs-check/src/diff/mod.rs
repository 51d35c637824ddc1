//! Differences between two dependency sets

use reqs_core::types::DeclarationKey;
use reqs_core::{Declaration, DependencySet};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Declarations added, removed or changed between two sets
#[derive(Debug, Clone, Default, Serialize)]
pub struct SetDiff {
    pub added: Vec<Declaration>,
    pub removed: Vec<Declaration>,
    pub changed: Vec<Change>,
}

/// Declaration whose constraint or source changed
#[derive(Debug, Clone, Serialize)]
pub struct Change {
    pub before: Declaration,
    pub after: Declaration,
}

impl SetDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Number of differing declarations
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Compare two sets by declaration key
///
/// Line order, comments and name spelling do not count as changes. Results
/// are sorted by normalized name.
pub fn diff_sets(old: &DependencySet, new: &DependencySet) -> SetDiff {
    let mut diff = SetDiff::default();
    let old_keys: HashMap<DeclarationKey, &Declaration> = old.iter().map(|d| (d.key(), d)).collect();
    let new_keys: HashMap<DeclarationKey, &Declaration> = new.iter().map(|d| (d.key(), d)).collect();

    for before in old.sorted() {
        match new_keys.get(&before.key()) {
            None => diff.removed.push(before.clone()),
            Some(after) if differs(before, after) => diff.changed.push(Change {
                before: before.clone(),
                after: (*after).clone(),
            }),
            Some(_) => {},
        }
    }

    for after in new.sorted() {
        if !old_keys.contains_key(&after.key()) {
            diff.added.push(after.clone());
        }
    }

    diff
}

fn differs(before: &Declaration, after: &Declaration) -> bool {
    before.specifiers != after.specifiers
        || before.source != after.source
        || before.extras != after.extras
        || before.editable != after.editable
}

impl fmt::Display for SetDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for declaration in &self.removed {
            for line in declaration.to_lines() {
                writeln!(f, "- {}", line)?;
            }
        }
        for declaration in &self.added {
            for line in declaration.to_lines() {
                writeln!(f, "+ {}", line)?;
            }
        }
        for change in &self.changed {
            for line in change.before.to_lines() {
                writeln!(f, "~ {}", line)?;
            }
            for line in change.after.to_lines() {
                writeln!(f, "  -> {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqs_core::Requirement;

    fn set(lines: &[&str]) -> DependencySet {
        let requirements: Vec<Requirement> = lines.iter().map(|l| l.parse().unwrap()).collect();
        DependencySet::from_requirements(&requirements).unwrap()
    }

    #[test]
    fn test_identical_sets() {
        let old = set(&["hypothesis==6.74.0", "vyper>=0.3.10", "black"]);
        let new = set(&["black", "Vyper>=0.3.10", "hypothesis==6.74.0"]);
        let diff = diff_sets(&old, &new);
        assert!(diff.is_empty());
        assert_eq!(diff.to_string(), "");
    }

    #[test]
    fn test_added_removed_changed() {
        let old = set(&["hypothesis==6.74.0", "pytest", "rich"]);
        let new = set(&["hypothesis==6.75.0", "pytest", "pyyaml"]);
        let diff = diff_sets(&old, &new);

        assert_eq!(diff.len(), 3);
        assert_eq!(diff.added[0].name.normalized(), "pyyaml");
        assert_eq!(diff.removed[0].name.normalized(), "rich");
        assert_eq!(diff.changed[0].before.specifiers.to_string(), "==6.74.0");
        assert_eq!(diff.changed[0].after.specifiers.to_string(), "==6.75.0");

        let text = diff.to_string();
        assert!(text.contains("- rich\n"));
        assert!(text.contains("+ pyyaml\n"));
        assert!(text.contains("~ hypothesis==6.74.0\n  -> hypothesis==6.75.0\n"));
    }

    #[test]
    fn test_source_change() {
        let old = set(&["titanoboa @ git+https://github.com/vyperlang/titanoboa.git@40e85c602aa2c15baaf5060547c1224178d9efae"]);
        let new = set(&["titanoboa @ git+https://github.com/vyperlang/titanoboa.git@0000000000000000000000000000000000000000"]);
        let diff = diff_sets(&old, &new);
        assert_eq!(diff.changed.len(), 1);
        assert!(diff.added.is_empty() && diff.removed.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let diff = diff_sets(&set(&["rich"]), &set(&["rich==13.0"]));
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["changed"][0]["after"]["specifiers"], "==13.0");
        assert_eq!(json["added"].as_array().unwrap().len(), 0);
    }
}
