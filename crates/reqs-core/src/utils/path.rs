//! Path utilities for include resolution and reporting.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving . and .. components lexically
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                // keep leading .. that would escape a relative base
                match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    },
                    Some(Component::RootDir | Component::Prefix(_)) => {},
                    _ => components.push(component),
                }
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Resolve an include target against the file that names it
pub fn resolve_relative(including_file: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return normalize_path(target);
    }
    let base = including_file.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&base.join(target))
}

/// Path relative to a root for display, or the path itself
pub fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
