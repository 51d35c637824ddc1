//! Include graph for `-r` and `-c` directives
//!
//! Loads a root manifest and every file it includes, transitively, into a
//! petgraph graph. Include targets resolve relative to the including file.
//! Cycles are rejected with the offending path.

use camino::{Utf8Path, Utf8PathBuf};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use reqs_core::utils::{normalize_path, resolve_relative};
use reqs_core::{DependencySet, ReqsError, ReqsResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

use crate::manifest::{load_manifest, Manifest};

/// How one file pulls in another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeKind {
    /// `-r FILE`: declarations join the set
    Requirements,
    /// `-c FILE`: declarations only constrain
    Constraints,
}

/// What a loaded file contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Requirements,
    Constraints,
}

/// One file in the include graph
#[derive(Debug, Clone)]
pub struct IncludedFile {
    pub path: Utf8PathBuf,
    pub role: FileRole,
    pub manifest: Manifest,
}

/// Root manifest and everything it includes
#[derive(Debug)]
pub struct ManifestTree {
    graph: DiGraph<IncludedFile, IncludeKind>,
    node_map: HashMap<Utf8PathBuf, NodeIndex>,
    root: NodeIndex,
}

/// Include directive that led to a file
struct Origin {
    parent: NodeIndex,
    kind: IncludeKind,
    file: String,
    line: usize,
}

impl ManifestTree {
    /// Load `root` and follow its includes
    pub async fn load(root: &Utf8Path) -> ReqsResult<Self> {
        let mut graph: DiGraph<IncludedFile, IncludeKind> = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut pending = vec![(to_utf8(normalize_path(root.as_std_path()))?, None::<Origin>)];

        while let Some((path, origin)) = pending.pop() {
            let node = match node_map.get(&path) {
                Some(&node) => node,
                None => {
                    let manifest = match (load_manifest(&path).await, &origin) {
                        (Ok(manifest), _) => manifest,
                        (Err(ReqsError::Io { source, .. }), Some(origin)) => {
                            return Err(ReqsError::parse(
                                &origin.file,
                                origin.line,
                                format!("Cannot read included file {}: {}", path, source),
                            ))
                        },
                        (Err(e), _) => return Err(e),
                    };

                    let mut includes = Vec::new();
                    for (line, kind, target) in manifest.includes() {
                        let resolved = to_utf8(resolve_relative(path.as_std_path(), target))?;
                        debug!("{}:{} includes {} ({:?})", path, line, resolved, kind);
                        includes.push((resolved, line, kind));
                    }

                    let node = graph.add_node(IncludedFile {
                        path: path.clone(),
                        role: FileRole::Requirements,
                        manifest,
                    });
                    node_map.insert(path.clone(), node);

                    // reversed so files are visited in the order they are named
                    for (resolved, line, kind) in includes.into_iter().rev() {
                        pending.push((
                            resolved,
                            Some(Origin {
                                parent: node,
                                kind,
                                file: path.to_string(),
                                line,
                            }),
                        ));
                    }
                    node
                },
            };

            if let Some(origin) = origin {
                graph.add_edge(origin.parent, node, origin.kind);
            }
        }

        let mut tree = Self {
            graph,
            node_map,
            root: NodeIndex::new(0),
        };
        tree.validate_no_cycles()?;
        tree.assign_roles();

        info!(
            "Loaded {} manifest file(s) from {}",
            tree.graph.node_count(),
            root
        );
        Ok(tree)
    }

    /// Reject include cycles
    pub fn validate_no_cycles(&self) -> ReqsResult<()> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => {
                let path = self.extract_cycle_path(cycle.node_id());
                Err(ReqsError::IncludeCycle {
                    cycle: self.format_cycle(&path),
                })
            },
        }
    }

    /// Shortest path from `start` back to itself
    fn extract_cycle_path(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for edge in self.graph.edges(current) {
                let next = edge.target();
                if next == start {
                    let mut path = vec![current];
                    let mut node = current;
                    while node != start {
                        node = previous[&node];
                        path.push(node);
                    }
                    path.reverse();
                    return path;
                }
                if !previous.contains_key(&next) {
                    previous.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        vec![start]
    }

    /// Format as "a.txt -> b.txt -> a.txt"
    fn format_cycle(&self, path: &[NodeIndex]) -> String {
        let mut names: Vec<&str> = path
            .iter()
            .map(|&node| self.graph[node].path.as_str())
            .collect();
        if let Some(&first) = names.first() {
            names.push(first);
        }
        names.join(" -> ")
    }

    /// Files reachable from the root through `-r` edges hold requirements;
    /// everything else was reached through a `-c` and only constrains
    fn assign_roles(&mut self) {
        let mut requirement_nodes = HashSet::from([self.root]);
        let mut stack = vec![self.root];

        while let Some(node) = stack.pop() {
            for edge in self.graph.edges(node) {
                if *edge.weight() == IncludeKind::Requirements
                    && requirement_nodes.insert(edge.target())
                {
                    stack.push(edge.target());
                }
            }
        }

        for node in self.graph.node_indices() {
            self.graph[node].role = if requirement_nodes.contains(&node) {
                FileRole::Requirements
            } else {
                FileRole::Constraints
            };
        }
    }

    /// The manifest passed to `load`
    pub fn root(&self) -> &IncludedFile {
        &self.graph[self.root]
    }

    /// Every loaded file, root first
    pub fn files(&self) -> impl Iterator<Item = &IncludedFile> {
        self.graph.node_indices().map(|node| &self.graph[node])
    }

    pub fn get(&self, path: &Utf8Path) -> Option<&IncludedFile> {
        self.node_map.get(path).map(|&node| &self.graph[node])
    }

    pub fn requirement_files(&self) -> impl Iterator<Item = &IncludedFile> {
        self.files().filter(|file| file.role == FileRole::Requirements)
    }

    pub fn constraint_files(&self) -> impl Iterator<Item = &IncludedFile> {
        self.files().filter(|file| file.role == FileRole::Constraints)
    }

    pub fn file_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Declarations of every requirements file merged into one set
    ///
    /// Constraint files narrow versions at install time but do not add
    /// packages, so they are left out.
    pub fn dependency_set(&self) -> ReqsResult<DependencySet> {
        let mut set = DependencySet::new();
        for file in self.requirement_files() {
            for declaration in file.manifest.dependency_set()?.iter() {
                set.insert_declaration(declaration.clone()).map_err(|e| {
                    let line = first_line(&file.manifest, declaration.name.normalized());
                    ReqsError::parse(&file.manifest.file, line, e.to_string())
                })?;
            }
        }
        Ok(set)
    }
}

fn first_line(manifest: &Manifest, normalized: &str) -> usize {
    manifest
        .requirement_lines()
        .find(|(_, r)| r.name.normalized() == normalized)
        .map(|(line, _)| line)
        .unwrap_or(1)
}

fn to_utf8(path: std::path::PathBuf) -> ReqsResult<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| {
        ReqsError::io(
            format!("Path is not valid UTF-8: {}", path.display()),
            std::io::Error::from(std::io::ErrorKind::InvalidInput),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(dir: &Utf8Path, name: &str, content: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, root)
    }

    #[tokio::test]
    async fn test_load_single_file() {
        let (_guard, dir) = temp_root();
        let root = write(&dir, "requirements.txt", "black\nvyper>=0.3.10\n").await;

        let tree = ManifestTree::load(&root).await.unwrap();
        assert_eq!(tree.file_count(), 1);
        assert_eq!(tree.root().path, root);
        assert_eq!(tree.dependency_set().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_includes_resolve_relative_to_including_file() {
        let (_guard, dir) = temp_root();
        let root = write(&dir, "requirements.txt", "-r requirements/dev.txt\nvyper>=0.3.10\n").await;
        write(&dir, "requirements/dev.txt", "-r ../base.txt\npytest\n").await;
        write(&dir, "base.txt", "hypothesis==6.74.0\n").await;

        let tree = ManifestTree::load(&root).await.unwrap();
        assert_eq!(tree.file_count(), 3);
        assert!(tree.get(&dir.join("base.txt")).is_some());

        let set = tree.dependency_set().unwrap();
        assert_eq!(
            set.to_requirements(),
            "hypothesis==6.74.0\npytest\nvyper>=0.3.10\n"
        );
    }

    #[tokio::test]
    async fn test_constraint_files_do_not_join_the_set() {
        let (_guard, dir) = temp_root();
        let root = write(&dir, "requirements.txt", "-c constraints.txt\npandas\n").await;
        write(&dir, "constraints.txt", "pandas<3\nnumpy<2\n").await;

        let tree = ManifestTree::load(&root).await.unwrap();
        assert_eq!(tree.constraint_files().count(), 1);
        assert_eq!(tree.requirement_files().count(), 1);

        let set = tree.dependency_set().unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.get("pandas").unwrap().specifiers.is_empty());
    }

    #[tokio::test]
    async fn test_shared_include_is_loaded_once() {
        let (_guard, dir) = temp_root();
        let root = write(&dir, "requirements.txt", "-r a.txt\n-r b.txt\n").await;
        write(&dir, "a.txt", "-r common.txt\nblack\n").await;
        write(&dir, "b.txt", "-r common.txt\nflake8\n").await;
        write(&dir, "common.txt", "isort\n").await;

        let tree = ManifestTree::load(&root).await.unwrap();
        assert_eq!(tree.file_count(), 4);
        assert_eq!(tree.dependency_set().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_include_cycle_is_rejected() {
        let (_guard, dir) = temp_root();
        let root = write(&dir, "requirements.txt", "-r dev.txt\nblack\n").await;
        write(&dir, "dev.txt", "-r requirements.txt\npytest\n").await;

        let err = ManifestTree::load(&root).await.unwrap_err();
        match err {
            ReqsError::IncludeCycle { cycle } => {
                assert!(cycle.contains("requirements.txt -> "));
                assert!(cycle.contains("dev.txt -> "));
                assert_eq!(cycle.matches(" -> ").count(), 2);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_self_include_is_a_cycle() {
        let (_guard, dir) = temp_root();
        let root = write(&dir, "requirements.txt", "-r requirements.txt\n").await;

        let err = ManifestTree::load(&root).await.unwrap_err();
        assert!(matches!(err, ReqsError::IncludeCycle { .. }));
    }

    #[tokio::test]
    async fn test_missing_include_points_at_directive() {
        let (_guard, dir) = temp_root();
        let root = write(&dir, "requirements.txt", "black\n-r missing.txt\n").await;

        let err = ManifestTree::load(&root).await.unwrap_err();
        match err {
            ReqsError::ManifestParse { file, line, message } => {
                assert_eq!(file, root.as_str());
                assert_eq!(line, 2);
                assert!(message.contains("missing.txt"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }
}
