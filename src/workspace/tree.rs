//! Hierarchical projection of the path table
//!
//! The tree is derived, never stored: every call to `build_tree` recomputes
//! the forest from the table's current snapshot. Expansion and collapse are
//! presentation concerns and live outside this module.

use super::path_table::{FileRecord, PathTable};

/// A node in the derived project tree.
///
/// The same shape doubles as ingestion input for `PathTable::load_batch`,
/// which is how the default template and local-directory imports hand the
/// table a nested batch of records.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub record: FileRecord,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(record: FileRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }

    pub fn branch(record: FileRecord, children: Vec<TreeNode>) -> Self {
        Self { record, children }
    }
}

/// Derive the project forest from the table's current snapshot.
///
/// Roots are records whose path contains no `/`. A record becomes a branch
/// when it is a directory or some other record's path extends it; its
/// children are exactly the records one segment deeper under its path —
/// direct children, not all descendants.
pub fn build_tree(table: &PathTable) -> Vec<TreeNode> {
    let snapshot = table.snapshot();
    let roots: Vec<&FileRecord> = snapshot.iter().filter(|r| !r.path.contains('/')).collect();
    build_level(&snapshot, &roots)
}

fn build_level(all: &[FileRecord], level: &[&FileRecord]) -> Vec<TreeNode> {
    level
        .iter()
        .map(|record| {
            if record.is_dir() || has_descendants(all, &record.path) {
                let prefix = format!("{}/", record.path);
                let child_depth = segment_count(&record.path) + 1;
                let children: Vec<&FileRecord> = all
                    .iter()
                    .filter(|r| r.path.starts_with(&prefix) && segment_count(&r.path) == child_depth)
                    .collect();
                TreeNode::branch((*record).clone(), build_level(all, &children))
            } else {
                TreeNode::leaf((*record).clone())
            }
        })
        .collect()
}

fn has_descendants(all: &[FileRecord], path: &str) -> bool {
    let prefix = format!("{path}/");
    all.iter().any(|r| r.path.starts_with(&prefix))
}

fn segment_count(path: &str) -> usize {
    path.split('/').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::path_table::FileKind;
    use proptest::prelude::*;

    fn table_with(paths: &[&str]) -> PathTable {
        let mut table = PathTable::new();
        for path in paths {
            table.upsert(FileRecord::file(*path, ""));
        }
        table
    }

    fn collect_paths(nodes: &[TreeNode], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.record.path.clone());
            collect_paths(&node.children, out);
        }
    }

    #[test]
    fn test_direct_children_only() {
        let table = table_with(&["src/a.js", "src/nested/b.js", "top.txt"]);
        let tree = build_tree(&table);

        // Roots: the implicit-parent record "src" has no record of its own,
        // so only explicitly stored slash-free paths appear at the root.
        let root_paths: Vec<&str> = tree.iter().map(|n| n.record.path.as_str()).collect();
        assert_eq!(root_paths, vec!["top.txt"]);
    }

    #[test]
    fn test_directory_record_collects_direct_children() {
        let mut table = table_with(&["src/a.js", "src/nested/b.js"]);
        table.upsert(FileRecord::directory("src"));
        table.upsert(FileRecord::directory("src/nested"));

        let tree = build_tree(&table);
        assert_eq!(tree.len(), 1);

        let src = &tree[0];
        assert_eq!(src.record.path, "src");
        let child_paths: Vec<&str> = src.children.iter().map(|n| n.record.path.as_str()).collect();
        assert_eq!(child_paths, vec!["src/a.js", "src/nested"]);

        let nested = src
            .children
            .iter()
            .find(|n| n.record.kind == FileKind::Directory)
            .unwrap();
        assert_eq!(nested.children.len(), 1);
        assert_eq!(nested.children[0].record.path, "src/nested/b.js");
    }

    #[test]
    fn test_two_builds_agree_without_mutation() {
        let mut table = table_with(&["b.txt", "a.txt", "src/x.js"]);
        table.upsert(FileRecord::directory("src"));

        let first = build_tree(&table);
        let second = build_tree(&table);
        assert_eq!(first, second);
    }

    proptest! {
        /// For arbitrary upsert/delete sequences: every node's children are
        /// exactly its one-segment-deeper descendants, no node appears twice,
        /// and no nested path surfaces at the root.
        #[test]
        fn prop_tree_is_a_direct_child_forest(
            ops in proptest::collection::vec(
                (prop::bool::ANY, prop::sample::select(vec![
                    "a", "b", "a/x", "a/y", "a/x/deep", "b/z", "c/only/leaf",
                ])),
                0..24,
            )
        ) {
            let mut table = PathTable::new();
            for (insert, path) in ops {
                if insert {
                    table.upsert(FileRecord::file(path, ""));
                } else {
                    table.delete(path);
                }
            }

            let tree = build_tree(&table);

            let mut seen = Vec::new();
            collect_paths(&tree, &mut seen);
            let mut deduped = seen.clone();
            deduped.sort();
            deduped.dedup();
            prop_assert_eq!(seen.len(), deduped.len(), "a node appeared twice");

            for root in &tree {
                prop_assert!(!root.record.path.contains('/'), "nested path at root");
            }

            fn check_children(node: &TreeNode) {
                let parent_depth = node.record.path.split('/').count();
                for child in &node.children {
                    assert!(child.record.path.starts_with(&format!("{}/", node.record.path)));
                    assert_eq!(child.record.path.split('/').count(), parent_depth + 1);
                    check_children(child);
                }
            }
            for root in &tree {
                check_children(root);
            }
        }
    }
}
