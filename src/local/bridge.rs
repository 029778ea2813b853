//! Local directory bridge
//!
//! `LocalBridge` owns the user's directory grant and its derived handles.
//! It produces record trees for the engine to ingest and performs reads and
//! writes against the real filesystem. It keeps shadow records for
//! bookkeeping only; the path table stays the single source of truth.
//!
//! Every operation that can fail against local storage degrades to a
//! boolean result with a logged diagnostic. Nothing here crashes the
//! engine.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;

use super::ignore::IgnoreRules;
use crate::workspace::{language_for_path, FileRecord, TreeNode};

/// Capability for obtaining a directory grant from the user.
///
/// `None` means the prompt was dismissed: a silent outcome, distinct from
/// any I/O failure. Interactive pickers belong to the presentation layer;
/// the engine only sees this trait.
#[async_trait]
pub trait FolderPicker: Send + Sync {
    async fn pick_folder(&self) -> Option<PathBuf>;
}

/// Picker that always grants a fixed directory. Used by tests and by hosts
/// that resolve the grant out of band (CLI arguments, saved grants).
#[derive(Debug, Clone)]
pub struct FixedFolderPicker {
    root: PathBuf,
}

impl FixedFolderPicker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FolderPicker for FixedFolderPicker {
    async fn pick_folder(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }
}

/// Bridge-side bookkeeping for one imported file. Never authoritative over
/// the path table.
#[derive(Debug, Clone)]
pub struct ShadowRecord {
    /// Absolute location on disk
    pub handle: PathBuf,
    pub name: String,
    /// Relative, normalized path below the granted root
    pub path: String,
    pub content: Option<String>,
    pub modified: bool,
}

/// Bridge to a user-granted local directory.
#[derive(Debug, Default)]
pub struct LocalBridge {
    root: Option<PathBuf>,
    handles: HashMap<String, PathBuf>,
    shadow: HashMap<String, ShadowRecord>,
    rules: IgnoreRules,
    ignore_file: String,
}

impl LocalBridge {
    pub fn new(ignore_file: impl Into<String>) -> Self {
        Self {
            ignore_file: ignore_file.into(),
            ..Self::default()
        }
    }

    /// Request a grant and import the directory.
    ///
    /// On grant: clears prior state, loads the top-level ignore file if
    /// present, traverses recursively (skipping ignored entries), reads file
    /// contents eagerly, and returns the resulting record trees. Returns
    /// `None` when the prompt was dismissed — silent, not an error — or when
    /// the traversal itself fails.
    pub async fn open_folder(&mut self, picker: &dyn FolderPicker) -> Option<Vec<TreeNode>> {
        let root = picker.pick_folder().await?;

        self.clear();
        self.rules = self.load_ignore_rules(&root).await;
        self.root = Some(root.clone());

        match self.load_directory(String::new(), root).await {
            Ok(tree) => Some(tree),
            Err(err) => {
                tracing::error!("failed to traverse granted directory: {err}");
                self.clear();
                None
            }
        }
    }

    /// Read the top-level ignore file. Absence is silently tolerated.
    async fn load_ignore_rules(&self, root: &Path) -> IgnoreRules {
        match tokio::fs::read_to_string(root.join(&self.ignore_file)).await {
            Ok(text) => {
                let rules = IgnoreRules::parse(&text);
                tracing::debug!("loaded {} ignore patterns", rules.len());
                rules
            }
            Err(_) => IgnoreRules::new(),
        }
    }

    // Recursive traversal; boxed because async fns cannot recurse directly.
    fn load_directory<'a>(
        &'a mut self,
        rel_path: String,
        dir: PathBuf,
    ) -> Pin<Box<dyn Future<Output = std::io::Result<Vec<TreeNode>>> + Send + 'a>> {
        Box::pin(async move {
            let mut nodes = Vec::new();

            let mut entries = Vec::new();
            let mut read_dir = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = read_dir.next_entry().await? {
                entries.push(entry);
            }
            entries.sort_by_key(|e| e.file_name());

            for entry in entries {
                let name = entry.file_name().to_string_lossy().into_owned();
                let entry_path = if rel_path.is_empty() {
                    name.clone()
                } else {
                    format!("{rel_path}/{name}")
                };

                if self.rules.is_ignored(&name, &entry_path) {
                    continue;
                }

                let file_type = entry.file_type().await?;
                if file_type.is_file() {
                    let content = match read_text(&entry.path()).await {
                        Some(content) => content,
                        None => continue,
                    };

                    self.handles.insert(entry_path.clone(), entry.path());
                    self.shadow.insert(
                        entry_path.clone(),
                        ShadowRecord {
                            handle: entry.path(),
                            name: name.clone(),
                            path: entry_path.clone(),
                            content: Some(content.clone()),
                            modified: false,
                        },
                    );

                    nodes.push(TreeNode::leaf(FileRecord {
                        path: entry_path,
                        name,
                        kind: crate::workspace::FileKind::File,
                        content: Some(content),
                        language: Some(language_for_path(&entry.path().to_string_lossy()).to_string()),
                    }));
                } else if file_type.is_dir() {
                    let children = self.load_directory(entry_path.clone(), entry.path()).await?;
                    nodes.push(TreeNode::branch(
                        FileRecord {
                            path: entry_path,
                            name,
                            kind: crate::workspace::FileKind::Directory,
                            content: None,
                            language: None,
                        },
                        children,
                    ));
                }
            }

            Ok(nodes)
        })
    }

    /// Write full content to a file below the granted root.
    ///
    /// With an existing handle, the file is overwritten through a scoped
    /// write that is closed on every exit path. Without one, intermediate
    /// directories are created first (idempotent) and a new handle is
    /// recorded. All failures are reported as `false` with a diagnostic.
    pub async fn write_file(&mut self, path: &str, content: &str) -> bool {
        if let Some(handle) = self.handles.get(path) {
            if let Err(err) = tokio::fs::write(handle, content).await {
                tracing::error!("failed to write {path}: {err}");
                return false;
            }

            if let Some(record) = self.shadow.get_mut(path) {
                record.content = Some(content.to_string());
                record.modified = false;
            }
            return true;
        }

        let Some(root) = self.root.clone() else {
            return false;
        };
        self.create_file_in_path(&root, path, content).await
    }

    /// Create a new file, materializing its parent directories first. Each
    /// directory creation is idempotent; "already exists" is not an error.
    async fn create_file_in_path(&mut self, root: &Path, path: &str, content: &str) -> bool {
        let absolute = root.join(path);

        if let Some(parent) = absolute.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                tracing::error!("failed to create directories for {path}: {err}");
                return false;
            }
        }

        if let Err(err) = tokio::fs::write(&absolute, content).await {
            tracing::error!("failed to create {path}: {err}");
            return false;
        }

        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.handles.insert(path.to_string(), absolute.clone());
        self.shadow.insert(
            path.to_string(),
            ShadowRecord {
                handle: absolute,
                name,
                path: path.to_string(),
                content: Some(content.to_string()),
                modified: false,
            },
        );
        true
    }

    /// Remove the named entry from its parent directory and evict it from
    /// the shadow maps.
    pub async fn delete_file(&mut self, path: &str) -> bool {
        let Some(root) = &self.root else {
            return false;
        };

        let absolute = root.join(path);
        if let Err(err) = tokio::fs::remove_file(&absolute).await {
            tracing::error!("failed to delete {path}: {err}");
            return false;
        }

        self.handles.remove(path);
        self.shadow.remove(path);
        true
    }

    pub fn shadow_record(&self, path: &str) -> Option<&ShadowRecord> {
        self.shadow.get(path)
    }

    pub fn is_connected(&self) -> bool {
        self.root.is_some()
    }

    /// Drop the grant, the handles, and the rule set.
    pub fn clear(&mut self) {
        self.root = None;
        self.handles.clear();
        self.shadow.clear();
        self.rules = IgnoreRules::new();
    }
}

/// Read a file as UTF-8 text. Unreadable or non-text files are skipped with
/// a warning rather than failing the whole import.
async fn read_text(path: &Path) -> Option<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("skipping unreadable file {}: {err}", path.display());
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            tracing::warn!("skipping non-text file {}", path.display());
            None
        }
    }
}
