// Virtual project workspace: the in-memory file table and its views
//
// The `PathTable` is the single source of truth for the virtual project.
// Everything else here is derived from it (the tree projection) or layered
// on top of it (open documents, language tags).

pub mod document;
pub mod language;
pub mod path_table;
pub mod tree;

pub use document::{DocumentId, OpenDocument, OpenDocuments};
pub use language::language_for_path;
pub use path_table::{FileKind, FileRecord, PathTable};
pub use tree::{build_tree, TreeNode};
