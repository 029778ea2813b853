//! Open document (tab) bookkeeping
//!
//! A document is an edit buffer layered over a path-table record. Its
//! content may diverge from the table between keystrokes and a save; the
//! owner decides when to write back.

use std::fmt;

use super::path_table::FileRecord;

/// Opaque identifier for an open document, unique per open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Doc({})", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub id: DocumentId,
    pub path: String,
    pub name: String,
    /// Local edit buffer; may diverge from the path table until a save.
    pub content: String,
    pub language: String,
    pub modified: bool,
}

/// The set of currently open documents, in opening order.
///
/// At most one document exists per distinct path at a time: opening an
/// already-open path returns the existing document.
#[derive(Debug, Default)]
pub struct OpenDocuments {
    docs: Vec<OpenDocument>,
    next_id: u64,
}

impl OpenDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document over a file record, or return the one already open
    /// for that path.
    pub fn open(&mut self, record: &FileRecord) -> DocumentId {
        if let Some(existing) = self.docs.iter().find(|d| d.path == record.path) {
            return existing.id;
        }

        let id = DocumentId(self.next_id);
        self.next_id += 1;
        self.docs.push(OpenDocument {
            id,
            path: record.path.clone(),
            name: record.name.clone(),
            content: record.content.clone().unwrap_or_default(),
            language: record
                .language
                .clone()
                .unwrap_or_else(|| super::language_for_path(&record.path).to_string()),
            modified: false,
        });
        id
    }

    pub fn get(&self, id: DocumentId) -> Option<&OpenDocument> {
        self.docs.iter().find(|d| d.id == id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&OpenDocument> {
        self.docs.iter().find(|d| d.path == path)
    }

    /// Replace the edit buffer and raise the modified flag. Returns false
    /// when the document is gone (closed tab), which callers treat as a
    /// silent no-op.
    pub fn update_content(&mut self, id: DocumentId, content: &str) -> bool {
        match self.docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                doc.content = content.to_string();
                doc.modified = true;
                true
            }
            None => false,
        }
    }

    /// Clear the modified flag after a successful save.
    pub fn mark_saved(&mut self, id: DocumentId) {
        if let Some(doc) = self.docs.iter_mut().find(|d| d.id == id) {
            doc.modified = false;
        }
    }

    pub fn close(&mut self, id: DocumentId) -> Option<OpenDocument> {
        let index = self.docs.iter().position(|d| d.id == id)?;
        Some(self.docs.remove(index))
    }

    /// Close the document for a path, if any. Used when the underlying file
    /// is deleted.
    pub fn close_path(&mut self, path: &str) -> Option<OpenDocument> {
        let index = self.docs.iter().position(|d| d.path == path)?;
        Some(self.docs.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenDocument> {
        self.docs.iter()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn clear(&mut self) {
        self.docs.clear();
    }
}
