// Bridge to a user-granted local directory
//
// The bridge traverses the granted directory into record trees and writes
// individual files back on demand. It never touches the path table itself;
// the workspace engine owns ingestion.

pub mod bridge;
pub mod ignore;

pub use bridge::{FixedFolderPicker, FolderPicker, LocalBridge, ShadowRecord};
pub use ignore::IgnoreRules;
