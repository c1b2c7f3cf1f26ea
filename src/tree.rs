//! In-memory hierarchical view derived from a flat object listing.

use std::collections::BTreeMap;

use crate::model::{FileKind, NodeMetadata, ObjectEntry};

/// One node of the tree: its own metadata plus, for directories, its
/// children keyed by name. A `BTreeMap` keeps children in ascending-name
/// order for free, which is what deterministic enumeration needs.
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    pub self_meta: NodeMetadata,
    pub children: BTreeMap<String, DirectoryNode>,
}

impl DirectoryNode {
    fn new_dir(name: impl Into<String>) -> Self {
        DirectoryNode {
            self_meta: NodeMetadata {
                name: name.into(),
                size: 0,
                kind: FileKind::Directory,
                mtime_ms: 0,
            },
            children: BTreeMap::new(),
        }
    }
}

/// Built, queryable directory tree. Rebuilt from scratch on every refresh;
/// never mutated in place once returned from [`DirectoryTree::build`].
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    root: DirectoryNode,
}

impl DirectoryTree {
    /// Builds a tree from an unordered set of listed objects, per the
    /// algorithm in `spec.md` §4.3. Malformed or colliding entries are
    /// logged and skipped rather than aborting the whole build.
    pub fn build(entries: &[ObjectEntry]) -> Self {
        let mut root = DirectoryNode::new_dir("/");

        for entry in entries {
            tracing::trace!(path = %entry.path, size = entry.size, "inserting listed object into tree");
            if let Err(reason) = insert(&mut root, entry) {
                tracing::warn!(path = %entry.path, %reason, "skipping object while building tree");
            }
        }

        backfill_directory_mtimes(&mut root);
        DirectoryTree { root }
    }

    /// Walks `path`'s components; returns `None` at the first missing edge.
    /// Root lookup (`"/"`) returns the root's own metadata.
    pub fn lookup(&self, path: &str) -> Option<NodeMetadata> {
        let components = split_components(path)?;
        let mut current = &self.root;
        for component in &components {
            current = current.children.get(*component)?;
        }
        Some(current.self_meta.clone())
    }

    /// Children of `path` in deterministic (ascending-name) order. Empty if
    /// `path` is a file or does not exist; callers distinguish "missing"
    /// from "empty directory" via a prior [`DirectoryTree::lookup`].
    pub fn list(&self, path: &str) -> Vec<NodeMetadata> {
        let Some(components) = split_components(path) else {
            return Vec::new();
        };
        let mut current = &self.root;
        for component in &components {
            match current.children.get(*component) {
                Some(node) => current = node,
                None => return Vec::new(),
            }
        }
        current.children.values().map(|n| n.self_meta.clone()).collect()
    }
}

/// Splits `"/a/b/c"` into `["a", "b", "c"]`; `"/"` into `[]`. Returns `None`
/// if `path` does not start with `/`.
fn split_components(path: &str) -> Option<Vec<&str>> {
    if !path.starts_with('/') {
        return None;
    }
    Some(path.split('/').filter(|c| !c.is_empty()).collect())
}

fn insert(root: &mut DirectoryNode, entry: &ObjectEntry) -> Result<(), String> {
    let components = split_components(&entry.path)
        .ok_or_else(|| format!("path {:?} does not start with '/'", entry.path))?;
    if components.is_empty() {
        return Err(format!("path {:?} has no components", entry.path));
    }

    let mut current = root;
    let (last, prefix) = components.split_last().expect("checked non-empty above");

    for component in prefix {
        let slot = current.children.entry((*component).to_string());
        let child = slot.or_insert_with(|| DirectoryNode::new_dir(*component));
        if child.self_meta.kind != FileKind::Directory {
            return Err(format!(
                "{:?} collides with an existing file at the same path",
                entry.path
            ));
        }
        current = child;
    }

    if current.children.contains_key(*last) {
        return Err(format!("{:?} already exists", entry.path));
    }

    current.children.insert(
        (*last).to_string(),
        DirectoryNode {
            self_meta: NodeMetadata {
                name: (*last).to_string(),
                size: entry.size,
                kind: FileKind::File,
                mtime_ms: entry.mtime_ms,
            },
            children: BTreeMap::new(),
        },
    );
    Ok(())
}

/// Gives each implicitly-created directory the max `mtime_ms` of any
/// descendant file, per `spec.md` §3's invariant. Post-order so children
/// are finalized before their parent reads them.
fn backfill_directory_mtimes(node: &mut DirectoryNode) -> i64 {
    if node.self_meta.kind == FileKind::File {
        return node.self_meta.mtime_ms;
    }
    let mut max_mtime = 0;
    for child in node.children.values_mut() {
        max_mtime = max_mtime.max(backfill_directory_mtimes(child));
    }
    node.self_meta.mtime_ms = max_mtime;
    max_mtime
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, size: u64, mtime_ms: i64) -> ObjectEntry {
        ObjectEntry { path: path.into(), size, mtime_ms }
    }

    fn s1_entries() -> Vec<ObjectEntry> {
        vec![
            entry("/a/b.txt", 5, 1000),
            entry("/a/c/d.txt", 7, 2000),
            entry("/e.txt", 3, 3000),
        ]
    }

    #[test]
    fn s1_root_is_directory() {
        let tree = DirectoryTree::build(&s1_entries());
        let root = tree.lookup("/").unwrap();
        assert_eq!(root.kind, FileKind::Directory);
        assert_eq!(root.size, 0);
    }

    #[test]
    fn s1_implicit_directory_has_zero_size() {
        let tree = DirectoryTree::build(&s1_entries());
        let a = tree.lookup("/a").unwrap();
        assert_eq!(a.kind, FileKind::Directory);
        assert_eq!(a.size, 0);
    }

    #[test]
    fn s1_file_attr_matches_entry() {
        let tree = DirectoryTree::build(&s1_entries());
        let b = tree.lookup("/a/b.txt").unwrap();
        assert_eq!(b.kind, FileKind::File);
        assert_eq!(b.size, 5);
        assert_eq!(b.mtime_ms, 1000);
    }

    #[test]
    fn s1_read_directory_lists_children_in_ascending_order() {
        let tree = DirectoryTree::build(&s1_entries());
        let names: Vec<_> = tree.list("/a").into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["b.txt", "c"]);
    }

    #[test]
    fn s1_missing_path_has_no_attr_and_empty_listing() {
        let tree = DirectoryTree::build(&s1_entries());
        assert!(tree.lookup("/missing").is_none());
        assert!(tree.list("/missing").is_empty());
    }

    #[test]
    fn directory_mtime_is_max_of_descendants() {
        let tree = DirectoryTree::build(&s1_entries());
        let a = tree.lookup("/a").unwrap();
        // max(b.txt=1000, c/d.txt=2000)
        assert_eq!(a.mtime_ms, 2000);
    }

    #[test]
    fn listing_a_file_path_returns_empty() {
        let tree = DirectoryTree::build(&s1_entries());
        assert_eq!(tree.lookup("/e.txt").unwrap().kind, FileKind::File);
        assert!(tree.list("/e.txt").is_empty());
    }

    #[test]
    fn duplicate_name_is_skipped_not_fatal() {
        let entries = vec![entry("/dup.txt", 1, 0), entry("/dup.txt", 2, 0)];
        let tree = DirectoryTree::build(&entries);
        // first one wins, second is dropped with a warning
        assert_eq!(tree.lookup("/dup.txt").unwrap().size, 1);
    }

    #[test]
    fn key_colliding_with_existing_directory_prefix_is_skipped() {
        // "a" is first created as a directory prefix for "a/b", then a
        // file key "a" collides with it.
        let entries = vec![entry("/a/b", 1, 0), entry("/a", 2, 0)];
        let tree = DirectoryTree::build(&entries);
        let a = tree.lookup("/a").unwrap();
        assert_eq!(a.kind, FileKind::Directory);
        assert_eq!(tree.lookup("/a/b").unwrap().size, 1);
    }

    #[test]
    fn no_two_siblings_share_a_name() {
        let entries = vec![entry("/x/a", 1, 0), entry("/x/b", 2, 0)];
        let tree = DirectoryTree::build(&entries);
        let names: Vec<_> = tree.list("/x").into_iter().map(|m| m.name).collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
    }
}
