//! Workspace engine
//!
//! The `WorkspaceEngine` is the owner that wires the pieces together: it
//! holds the path table, the open documents, the local bridge, and the
//! session runtime as explicitly constructed instances. Nothing here is a
//! process-wide singleton; hosts build an engine at workspace-open and drop
//! or reset it at workspace-close.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::local::{FolderPicker, LocalBridge};
use crate::session::{
    OutputKind, OutputLine, Sandbox, SessionEvents, SessionRuntime, SessionState,
};
use crate::template;
use crate::workspace::{build_tree, DocumentId, OpenDocument, OpenDocuments, PathTable, TreeNode};

/// Orchestrates the virtual project, the local-directory bridge, and the
/// execution session for one workspace.
pub struct WorkspaceEngine {
    table: PathTable,
    documents: OpenDocuments,
    bridge: LocalBridge,
    session: SessionRuntime,
    events: SessionEvents,
    picker: Arc<dyn FolderPicker>,
    output_log: Vec<OutputLine>,
    use_local: bool,
}

impl WorkspaceEngine {
    /// Build an engine with injected capabilities and the default template
    /// loaded into the path table.
    pub fn new(
        config: EngineConfig,
        picker: Arc<dyn FolderPicker>,
        sandbox: Arc<dyn Sandbox>,
    ) -> Self {
        let mut table = PathTable::new();
        table.load_batch(&template::default_project(), "");

        let (session, events) =
            SessionRuntime::new(sandbox, config.install.clone(), config.start.clone());

        Self {
            table,
            documents: OpenDocuments::new(),
            bridge: LocalBridge::new(config.ignore_file.clone()),
            session,
            events,
            picker,
            output_log: Vec::new(),
            use_local: false,
        }
    }

    /// Current project forest, derived fresh from the path table.
    pub fn tree(&self) -> Vec<TreeNode> {
        build_tree(&self.table)
    }

    pub fn path_table(&self) -> &PathTable {
        &self.table
    }

    pub fn is_local_connected(&self) -> bool {
        self.use_local
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn preview_url(&self) -> Option<String> {
        self.session.preview_url()
    }

    /// Request a local-directory grant and, on success, replace the virtual
    /// project with the imported tree. A dismissed prompt leaves everything
    /// untouched and returns false.
    pub async fn open_folder(&mut self) -> bool {
        let picker = Arc::clone(&self.picker);
        let Some(tree) = self.bridge.open_folder(picker.as_ref()).await else {
            return false;
        };

        self.table.replace_with(&tree);
        self.use_local = true;
        self.log(OutputKind::Info, "Local folder connected");
        true
    }

    /// Open a document over a file in the virtual project. Returns the
    /// existing document when the path is already open; `None` for
    /// directories and unknown paths.
    pub fn open_document(&mut self, path: &str) -> Option<DocumentId> {
        let record = self.table.get(path)?;
        if !record.is_file() {
            return None;
        }
        let record = record.clone();
        Some(self.documents.open(&record))
    }

    pub fn document(&self, id: DocumentId) -> Option<&OpenDocument> {
        self.documents.get(id)
    }

    pub fn open_documents(&self) -> impl Iterator<Item = &OpenDocument> {
        self.documents.iter()
    }

    /// Apply one editor change: update the document buffer, raise its
    /// modified flag, and write through to the path table. Called per
    /// change; debouncing is the caller's concern. Edits against a closed
    /// document or a vanished path are silent no-ops.
    pub fn update_document(&mut self, id: DocumentId, content: &str) {
        if !self.documents.update_content(id, content) {
            return;
        }
        if let Some(doc) = self.documents.get(id) {
            let path = doc.path.clone();
            self.table.set_content(&path, content);
        }
    }

    pub fn close_document(&mut self, id: DocumentId) {
        self.documents.close(id);
    }

    /// Save a document: write back to the local directory when connected
    /// and into the live session mount when running, then clear the
    /// modified flag and log the save.
    pub async fn save_document(&mut self, id: DocumentId) -> bool {
        let Some(doc) = self.documents.get(id) else {
            return false;
        };
        let path = doc.path.clone();
        let content = doc.content.clone();

        let mut saved = true;
        if self.use_local {
            saved &= self.bridge.write_file(&path, &content).await;
        }
        if self.session.is_running() {
            self.session.write_file(&path, &content).await;
        }

        if saved {
            self.documents.mark_saved(id);
            self.log(OutputKind::Info, format!("Saved: {path}"));
        }
        saved
    }

    /// Create a file in the virtual project (and on disk when a local
    /// directory is connected).
    pub async fn create_file(&mut self, parent: &str, name: &str, content: &str) -> String {
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}/{name}")
        };

        self.table
            .upsert(crate::workspace::FileRecord::file(path.clone(), content));
        if self.use_local {
            self.bridge.write_file(&path, content).await;
        }
        path
    }

    /// Delete a file everywhere it exists: path table, open documents, and
    /// the local directory when connected.
    pub async fn delete_file(&mut self, path: &str) -> bool {
        let existed = self.table.delete(path).is_some();
        self.documents.close_path(path);

        if self.use_local {
            self.bridge.delete_file(path).await && existed
        } else {
            existed
        }
    }

    /// Run the project: boot the sandbox if needed, mount the flattened
    /// virtual project, install dependencies, and start the dev process.
    /// Only a boot failure escapes as an error; install and start failures
    /// surface as output lines.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.session.boot().await?;

        let files = self.table.flatten_contents();
        self.session.mount(&files).await;
        self.session.install().await;
        self.session.start().await;
        Ok(())
    }

    pub async fn stop(&mut self) {
        self.session.stop().await;
    }

    /// Reset the workspace: stop the session, restore the default template,
    /// close all documents, drop the local grant, and clear the output log
    /// and preview URL.
    pub async fn reset(&mut self) {
        self.session.stop().await;

        self.table.replace_with(&template::default_project());
        self.documents.clear();
        self.bridge.clear();
        self.use_local = false;

        self.pump_events();
        self.output_log.clear();
    }

    /// Tear the workspace down at close: stop and discard the session,
    /// drop the local grant, and flush remaining events. A later `run`
    /// boots a fresh session.
    pub async fn teardown(&mut self) {
        self.session.cleanup().await;
        self.bridge.clear();
        self.use_local = false;
        self.pump_events();
    }

    /// Drain pending session events into the output log. The engine is the
    /// single subscriber of the session's channels; hosts call this from
    /// their update loop (or after awaited operations) and then read
    /// `output_log`.
    pub fn pump_events(&mut self) {
        while let Ok(line) = self.events.output.try_recv() {
            self.output_log.push(line);
        }
        // URL changes are mirrored by the session itself; draining here
        // just keeps the channel from accumulating.
        while self.events.url_changes.try_recv().is_ok() {}
    }

    pub fn output_log(&self) -> &[OutputLine] {
        &self.output_log
    }

    fn log(&mut self, kind: OutputKind, content: impl Into<String>) {
        self.output_log.push(OutputLine::new(kind, content));
    }
}
