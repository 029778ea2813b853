// Sandboxed execution sessions
//
// One session is one boot -> mount -> install -> start -> stop run against
// the sandbox capability. Output lines and preview URL changes travel over
// per-session channels to a single subscriber.

pub mod runtime;
pub mod sandbox;
pub mod sanitize;

pub use runtime::{OutputKind, OutputLine, SessionEvents, SessionRuntime, SessionState};
pub use sandbox::{ProcessSandbox, ProcessStream, Sandbox, SandboxProcess, ServerReady};
pub use sanitize::sanitize;
