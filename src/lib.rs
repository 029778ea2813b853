//! Workspace engine for a browser-hosted code editor.
//!
//! The engine keeps a project's file tree in memory, bridges it to a
//! user-granted local directory, and drives the lifecycle of a sandboxed
//! dev-server session with live output and preview URL discovery.

pub mod config;
pub mod engine;
pub mod local;
pub mod logging;
pub mod session;
pub mod template;
pub mod workspace;

pub use config::EngineConfig;
pub use engine::WorkspaceEngine;
pub use local::{FixedFolderPicker, FolderPicker, LocalBridge};
pub use session::{OutputKind, OutputLine, Sandbox, SessionRuntime, SessionState};
pub use workspace::{FileKind, FileRecord, PathTable, TreeNode};
