//! Flat path-keyed storage for the virtual project
//!
//! Every file and directory is a single `FileRecord` keyed by its
//! normalized path (slash-separated, no leading slash). Directories may be
//! implicit: a file at `src/App.jsx` is enough for `src` to show up in the
//! derived tree even without its own record.

use super::tree::TreeNode;

/// Kind of workspace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Directory,
}

/// A single entry in the virtual project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Normalized path, the storage key
    pub path: String,
    /// Final path segment
    pub name: String,
    pub kind: FileKind,
    /// Text content; `None` means not yet loaded. Never `Some` for directories.
    pub content: Option<String>,
    /// Advisory language tag derived from the extension
    pub language: Option<String>,
}

impl FileRecord {
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let name = final_segment(&path);
        let language = Some(super::language_for_path(&path).to_string());
        Self {
            path,
            name,
            kind: FileKind::File,
            content: Some(content.into()),
            language,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = final_segment(&path);
        Self {
            path,
            name,
            kind: FileKind::Directory,
            content: None,
            language: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

fn final_segment(path: &str) -> String {
    path.trim_start_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// The ground truth for the virtual project: one record per normalized path.
///
/// A `BTreeMap` keeps snapshot iteration ordered by path, so two tree builds
/// with no intervening mutation see the same shape in the same order.
#[derive(Debug, Default)]
pub struct PathTable {
    files: std::collections::BTreeMap<String, FileRecord>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record at its normalized path.
    ///
    /// An absolute path has the leading slash stripped and is stored as-is;
    /// this is the same rule `load_batch` applies to top-level entries.
    pub fn upsert(&mut self, mut record: FileRecord) {
        let key = record.path.trim_start_matches('/').to_string();
        record.path = key.clone();
        self.files.insert(key, record);
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn delete(&mut self, path: &str) -> Option<FileRecord> {
        self.files.remove(path)
    }

    /// Replace a file's content. A missing path is a silent no-op: the edit
    /// target vanished, which is a non-fatal condition here.
    pub fn set_content(&mut self, path: &str, content: &str) {
        if let Some(record) = self.files.get_mut(path) {
            record.content = Some(content.to_string());
        }
    }

    /// All file records (directories excluded), in path order.
    pub fn all_files(&self) -> Vec<&FileRecord> {
        self.files.values().filter(|r| r.is_file()).collect()
    }

    /// Files with loaded content, flattened to `(path, content)` pairs in
    /// path order. This is the shape a session mount consumes.
    pub fn flatten_contents(&self) -> Vec<(String, String)> {
        self.files
            .values()
            .filter_map(|r| match (&r.kind, &r.content) {
                (FileKind::File, Some(content)) => Some((r.path.clone(), content.clone())),
                _ => None,
            })
            .collect()
    }

    /// Current records in path order.
    pub fn snapshot(&self) -> Vec<FileRecord> {
        self.files.values().cloned().collect()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Ingest a batch of record trees under `base_path`.
    ///
    /// Normalization is deliberately dual: an absolute incoming path (leading
    /// `/`) is stripped and stored as-is, while a relative incoming path is
    /// prefixed with `base_path`. Callers mix absolute top-level entries with
    /// relative nested children in one pass, so nested children never need to
    /// re-specify their ancestry. Children of each node are ingested
    /// recursively with the node's own path as the new base.
    pub fn load_batch(&mut self, records: &[TreeNode], base_path: &str) {
        for node in records {
            let full_path = match node.record.path.strip_prefix('/') {
                Some(stripped) => stripped.to_string(),
                None => format!("{base_path}{}", node.record.path),
            };

            let mut record = node.record.clone();
            record.path = full_path.clone();
            self.files.insert(full_path.clone(), record);

            if !node.children.is_empty() {
                self.load_batch(&node.children, &format!("{full_path}/"));
            }
        }
    }

    /// Clear the table and ingest a fresh set of record trees.
    pub fn replace_with(&mut self, records: &[TreeNode]) {
        self.clear();
        self.load_batch(records, "");
    }
}
