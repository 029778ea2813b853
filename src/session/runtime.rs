//! Session lifecycle state machine
//!
//! One `SessionRuntime` drives one execution session against the sandbox
//! capability: boot, mount the project, install dependencies, start the
//! long-lived dev process, stream its output, and discover the preview URL
//! from readiness signals. Output lines and URL changes are delivered over
//! per-session channels to a single subscriber.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::sandbox::{ProcessStream, Sandbox};
use super::sanitize::sanitize;
use crate::config::CommandSpec;

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Booting,
    Ready,
    Mounting,
    Installing,
    Running,
    Stopped,
    /// Unrecoverable boot/runtime failure; only a fresh boot leaves this.
    Faulted,
}

/// Source tag of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Stdout,
    Stderr,
    Command,
    Info,
}

/// One timestamped line of session output.
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub content: String,
    pub kind: OutputKind,
    pub timestamp: DateTime<Utc>,
}

impl OutputLine {
    pub fn new(kind: OutputKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Receiving ends of a session's channels: output lines and preview URL
/// changes, each in delivery order. Consumed by a single subscriber.
pub struct SessionEvents {
    pub output: mpsc::UnboundedReceiver<OutputLine>,
    pub url_changes: mpsc::UnboundedReceiver<String>,
}

/// Owns the session state exclusively; all mutation goes through `&mut
/// self`, so transitions are serialized by construction.
pub struct SessionRuntime {
    sandbox: Arc<dyn Sandbox>,
    state: SessionState,
    // Shared with the readiness task, which observes signals while the
    // runtime is doing other work.
    preview_url: Arc<Mutex<Option<String>>>,
    output_tx: mpsc::UnboundedSender<OutputLine>,
    url_tx: mpsc::UnboundedSender<String>,
    kill_tx: Option<oneshot::Sender<()>>,
    stream_task: Option<JoinHandle<()>>,
    ready_task: Option<JoinHandle<()>>,
    install: CommandSpec,
    start: CommandSpec,
}

impl SessionRuntime {
    pub fn new(
        sandbox: Arc<dyn Sandbox>,
        install: CommandSpec,
        start: CommandSpec,
    ) -> (Self, SessionEvents) {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (url_tx, url_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            sandbox,
            state: SessionState::Uninitialized,
            preview_url: Arc::new(Mutex::new(None)),
            output_tx,
            url_tx,
            kill_tx: None,
            stream_task: None,
            ready_task: None,
            install,
            start,
        };
        let events = SessionEvents {
            output: output_rx,
            url_changes: url_rx,
        };
        (runtime, events)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn preview_url(&self) -> Option<String> {
        self.preview_url.lock().ok().and_then(|url| url.clone())
    }

    pub fn is_booted(&self) -> bool {
        matches!(
            self.state,
            SessionState::Ready
                | SessionState::Mounting
                | SessionState::Installing
                | SessionState::Running
        )
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Boot the sandbox. Already-booted sessions return immediately; a boot
    /// failure is the one error that escapes, leaving the session faulted
    /// until the next boot attempt.
    pub async fn boot(&mut self) -> anyhow::Result<()> {
        if self.is_booted() {
            return Ok(());
        }

        self.state = SessionState::Booting;
        self.emit(OutputKind::Info, "Initializing sandbox...");

        if let Err(err) = self.sandbox.boot().await {
            self.state = SessionState::Faulted;
            self.emit(OutputKind::Stderr, format!("Sandbox boot failed: {err}"));
            return Err(err);
        }

        self.spawn_ready_task();
        self.state = SessionState::Ready;
        self.emit(OutputKind::Info, "Sandbox ready");
        Ok(())
    }

    // Forward readiness signals: set the preview URL, notify subscribers.
    // Every signal re-notifies; with one process per session that is the
    // desired behavior, not a bug to deduplicate.
    fn spawn_ready_task(&mut self) {
        if let Some(previous) = self.ready_task.take() {
            previous.abort();
        }

        let mut ready_rx = self.sandbox.subscribe_server_ready();
        let output_tx = self.output_tx.clone();
        let url_tx = self.url_tx.clone();
        let preview_url = Arc::clone(&self.preview_url);

        self.ready_task = Some(tokio::spawn(async move {
            while let Some(ready) = ready_rx.recv().await {
                let _ = output_tx.send(OutputLine::new(
                    OutputKind::Info,
                    format!("Server ready on port {}: {}", ready.port, ready.url),
                ));
                if let Ok(mut url) = preview_url.lock() {
                    *url = Some(ready.url.clone());
                }
                let _ = url_tx.send(ready.url);
            }
        }));
    }

    /// Mount a flattened project into the sandbox filesystem.
    ///
    /// Directories implied by the file paths are created first, sorted
    /// lexicographically so ancestors materialize before descendants, then
    /// files are written in the same order. A failing write is logged to
    /// the output channel and does not block the rest of the batch.
    pub async fn mount(&mut self, files: &[(String, String)]) {
        if !self.is_booted() {
            tracing::warn!("mount requested before boot");
            return;
        }

        self.state = SessionState::Mounting;
        self.emit(OutputKind::Info, "Mounting files...");

        let mut dirs = BTreeSet::new();
        for (path, _) in files {
            let segments: Vec<&str> = path.split('/').collect();
            let mut prefix = String::new();
            for segment in &segments[..segments.len().saturating_sub(1)] {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);
                dirs.insert(prefix.clone());
            }
        }

        for dir in &dirs {
            if let Err(err) = self.sandbox.mkdir_recursive(dir).await {
                // Pre-existing directories are expected; anything else is
                // logged and the batch continues.
                if err.kind() != std::io::ErrorKind::AlreadyExists {
                    tracing::debug!("mkdir {dir}: {err}");
                }
            }
        }

        let mut sorted: Vec<&(String, String)> = files.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, contents) in sorted {
            if let Err(err) = self.sandbox.write_file(path, contents).await {
                self.emit(OutputKind::Stderr, format!("Failed to write {path}: {err}"));
            }
        }

        self.state = SessionState::Ready;
        self.emit(OutputKind::Info, "Files mounted");
    }

    /// Run the install command to completion, streaming its output.
    ///
    /// A non-zero exit is surfaced as an error line but leaves the session
    /// usable; the caller decides whether to proceed to `start`.
    pub async fn install(&mut self) {
        if !self.is_booted() {
            tracing::warn!("install requested before boot");
            return;
        }

        self.state = SessionState::Installing;
        self.emit(OutputKind::Info, "Installing dependencies...");
        self.emit(OutputKind::Command, self.install.display());

        let spawned = self.sandbox.spawn(&self.install.program, &self.install.args).await;
        let mut process = match spawned {
            Ok(process) => process,
            Err(err) => {
                self.emit(OutputKind::Stderr, format!("Failed to install dependencies: {err}"));
                self.state = SessionState::Ready;
                return;
            }
        };

        while let Some((stream, line)) = process.next_line().await {
            self.forward(stream, &line);
        }

        let exit_code = process.wait().await;
        if exit_code == 0 {
            self.emit(OutputKind::Info, "Dependencies installed successfully");
        } else {
            self.emit(
                OutputKind::Stderr,
                format!("Failed to install dependencies (exit code {exit_code})"),
            );
        }
        self.state = SessionState::Ready;
    }

    /// Spawn the long-lived dev process. Returns once the process is
    /// spawned; it does not wait for exit. Output streams in the
    /// background until the process ends or `stop` is called.
    pub async fn start(&mut self) {
        if self.state != SessionState::Ready {
            tracing::warn!(state = ?self.state, "start requested outside ready state");
            return;
        }

        self.emit(OutputKind::Info, "Starting dev server...");
        self.emit(OutputKind::Command, self.start.display());

        let mut process = match self.sandbox.spawn(&self.start.program, &self.start.args).await {
            Ok(process) => process,
            Err(err) => {
                self.emit(OutputKind::Stderr, format!("Failed to start dev server: {err}"));
                return;
            }
        };

        let (kill_tx, mut kill_rx) = oneshot::channel();
        self.kill_tx = Some(kill_tx);
        let output_tx = self.output_tx.clone();

        self.stream_task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    line = process.next_line() => match line {
                        Some((stream, line)) => {
                            let kind = match stream {
                                ProcessStream::Stdout => OutputKind::Stdout,
                                ProcessStream::Stderr => OutputKind::Stderr,
                            };
                            let _ = output_tx.send(OutputLine::new(kind, sanitize(&line)));
                        }
                        None => break,
                    },
                    _ = &mut kill_rx => {
                        process.kill().await;
                        break;
                    }
                }
            }
        }));

        self.state = SessionState::Running;
    }

    /// Stop the session. Idempotent: with no active process this still
    /// clears the preview URL and notifies subscribers with an empty URL to
    /// signal teardown.
    pub async fn stop(&mut self) {
        if let Some(kill) = self.kill_tx.take() {
            let _ = kill.send(());
            if let Some(task) = self.stream_task.take() {
                let _ = task.await;
            }
            self.emit(OutputKind::Info, "Dev server stopped");
        }

        if self.state == SessionState::Running {
            self.state = SessionState::Stopped;
        }

        if let Ok(mut url) = self.preview_url.lock() {
            *url = None;
        }
        let _ = self.url_tx.send(String::new());
    }

    /// Push one file into the live sandbox mount. No-op before boot.
    pub async fn write_file(&mut self, path: &str, content: &str) {
        if !self.is_booted() {
            return;
        }

        match self.sandbox.write_file(path, content).await {
            Ok(()) => self.emit(OutputKind::Info, format!("Updated in sandbox: {path}")),
            Err(err) => self.emit(OutputKind::Stderr, format!("Failed to update {path}: {err}")),
        }
    }

    /// Tear the session down: stop the process, drop the readiness
    /// subscription, and return to the uninitialized state.
    pub async fn cleanup(&mut self) {
        self.stop().await;
        if let Some(task) = self.ready_task.take() {
            task.abort();
        }
        self.state = SessionState::Uninitialized;
    }

    fn forward(&self, stream: ProcessStream, line: &str) {
        let kind = match stream {
            ProcessStream::Stdout => OutputKind::Stdout,
            ProcessStream::Stderr => OutputKind::Stderr,
        };
        self.emit(kind, sanitize(line));
    }

    fn emit(&self, kind: OutputKind, content: impl Into<String>) {
        let _ = self.output_tx.send(OutputLine::new(kind, content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::sandbox::{SandboxProcess, ServerReady};
    use async_trait::async_trait;

    /// Minimal double: boot succeeds or fails by flag, spawns always fail.
    struct NullSandbox {
        boot_fails: bool,
    }

    #[async_trait]
    impl Sandbox for NullSandbox {
        async fn boot(&self) -> anyhow::Result<()> {
            if self.boot_fails {
                anyhow::bail!("capability unavailable")
            }
            Ok(())
        }

        async fn mkdir_recursive(&self, _path: &str) -> std::io::Result<()> {
            Ok(())
        }

        async fn write_file(&self, _path: &str, _contents: &str) -> std::io::Result<()> {
            Ok(())
        }

        async fn spawn(
            &self,
            command: &str,
            _args: &[String],
        ) -> anyhow::Result<Box<dyn SandboxProcess>> {
            anyhow::bail!("no such command: {command}")
        }

        fn subscribe_server_ready(&self) -> mpsc::UnboundedReceiver<ServerReady> {
            mpsc::unbounded_channel().1
        }
    }

    fn runtime(boot_fails: bool) -> (SessionRuntime, SessionEvents) {
        SessionRuntime::new(
            Arc::new(NullSandbox { boot_fails }),
            CommandSpec::new("pnpm", ["install"]),
            CommandSpec::new("pnpm", ["run", "dev"]),
        )
    }

    #[tokio::test]
    async fn test_boot_failure_faults_until_next_boot() {
        let (mut session, _events) = runtime(true);

        assert!(session.boot().await.is_err());
        assert_eq!(session.state(), SessionState::Faulted);

        // Nothing but a fresh boot leaves the faulted state.
        session.install().await;
        assert_eq!(session.state(), SessionState::Faulted);
        assert!(session.boot().await.is_err());
        assert_eq!(session.state(), SessionState::Faulted);
    }

    #[tokio::test]
    async fn test_boot_is_idempotent_when_ready() {
        let (mut session, _events) = runtime(false);
        session.boot().await.unwrap();
        session.boot().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_stop_without_start_notifies_empty_url_once() {
        let (mut session, mut events) = runtime(false);

        session.stop().await;

        assert_eq!(session.preview_url(), None);
        assert_eq!(events.url_changes.try_recv().unwrap(), "");
        assert!(events.url_changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_install_spawn_leaves_session_usable() {
        let (mut session, mut events) = runtime(false);
        session.boot().await.unwrap();

        session.install().await;
        assert_eq!(session.state(), SessionState::Ready);

        let mut saw_error = false;
        while let Ok(line) = events.output.try_recv() {
            if line.kind == OutputKind::Stderr && line.content.contains("Failed to install") {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_start_outside_ready_is_rejected() {
        let (mut session, _events) = runtime(false);
        session.start().await;
        assert_eq!(session.state(), SessionState::Uninitialized);
    }
}
