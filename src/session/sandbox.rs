//! Sandbox runtime capability
//!
//! The session state machine talks to the execution runtime through the
//! narrow `Sandbox` trait: boot, filesystem writes, process spawning, and a
//! server-ready event subscription. Tests swap in a scripted double;
//! production uses `ProcessSandbox`, which mounts files into a scratch
//! directory and runs real processes there.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// A readiness signal: a spawned process is listening on `port`, reachable
/// at `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReady {
    pub port: u16,
    pub url: String,
}

/// Which stream a process line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStream {
    Stdout,
    Stderr,
}

/// Handle to one process running inside the sandbox.
#[async_trait]
pub trait SandboxProcess: Send {
    /// Next output line in arrival order; `None` once both streams closed.
    async fn next_line(&mut self) -> Option<(ProcessStream, String)>;

    /// Wait for the process to exit. Unknown exit codes map to -1.
    async fn wait(&mut self) -> i32;

    /// Kill the process. Killing an already-dead process is a no-op.
    async fn kill(&mut self);
}

/// The sandboxed execution runtime, reduced to exactly the operations the
/// session needs.
#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn boot(&self) -> anyhow::Result<()>;

    /// Create a directory and any missing ancestors. Pre-existing
    /// directories are not an error.
    async fn mkdir_recursive(&self, path: &str) -> std::io::Result<()>;

    async fn write_file(&self, path: &str, contents: &str) -> std::io::Result<()>;

    async fn spawn(&self, command: &str, args: &[String])
        -> anyhow::Result<Box<dyn SandboxProcess>>;

    /// Subscribe to server-ready events. Subscriptions made before a spawn
    /// observe that process's signals.
    fn subscribe_server_ready(&self) -> mpsc::UnboundedReceiver<ServerReady>;
}

// Local URL printed by a dev server once it starts listening.
static SERVED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0):(\d{1,5})\S*)").unwrap()
});

/// Scan one output line for a served local URL.
fn detect_server_ready(line: &str) -> Option<ServerReady> {
    let captures = SERVED_URL.captures(line)?;
    let url = captures.get(1)?.as_str().to_string();
    let port: u16 = captures.get(2)?.as_str().parse().ok()?;
    Some(ServerReady { port, url })
}

/// Sandbox backed by a scratch directory and real child processes.
///
/// Unlike a hosted container runtime there is no host-side readiness event,
/// so readiness is derived: each spawned process's output is scanned for
/// the first served-URL line and a `ServerReady` is synthesized from it.
pub struct ProcessSandbox {
    root: PathBuf,
    ready_subscribers: Mutex<Vec<mpsc::UnboundedSender<ServerReady>>>,
}

impl ProcessSandbox {
    /// `root` is the mount directory files are materialized into and
    /// processes run from. Created on boot.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ready_subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn ready_senders(&self) -> Vec<mpsc::UnboundedSender<ServerReady>> {
        self.ready_subscribers
            .lock()
            .map(|subscribers| subscribers.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn boot(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| anyhow::anyhow!("failed to create sandbox root: {err}"))
    }

    async fn mkdir_recursive(&self, path: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.join(path)).await
    }

    async fn write_file(&self, path: &str, contents: &str) -> std::io::Result<()> {
        tokio::fs::write(self.root.join(path), contents).await
    }

    async fn spawn(
        &self,
        command: &str,
        args: &[String],
    ) -> anyhow::Result<Box<dyn SandboxProcess>> {
        let mut child = Command::new(command)
            .args(args)
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| anyhow::anyhow!("failed to spawn {command}: {err}"))?;

        // Forward both streams into one channel so the consumer sees lines
        // in arrival order.
        let (line_tx, line_rx) = mpsc::unbounded_channel();

        if let Some(stdout) = child.stdout.take() {
            let tx = line_tx.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send((ProcessStream::Stdout, line)).is_err() {
                        break;
                    }
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = line_tx.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send((ProcessStream::Stderr, line)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(line_tx);

        Ok(Box::new(LocalProcess {
            child,
            lines: line_rx,
            ready_senders: self.ready_senders(),
        }))
    }

    fn subscribe_server_ready(&self) -> mpsc::UnboundedReceiver<ServerReady> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.ready_subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }
}

/// A child process with merged line streaming and readiness scanning.
struct LocalProcess {
    child: tokio::process::Child,
    lines: mpsc::UnboundedReceiver<(ProcessStream, String)>,
    ready_senders: Vec<mpsc::UnboundedSender<ServerReady>>,
}

#[async_trait]
impl SandboxProcess for LocalProcess {
    async fn next_line(&mut self) -> Option<(ProcessStream, String)> {
        let (stream, line) = self.lines.recv().await?;

        if let Some(ready) = detect_server_ready(&line) {
            for sender in &self.ready_senders {
                let _ = sender.send(ready.clone());
            }
        }

        Some((stream, line))
    }

    async fn wait(&mut self) -> i32 {
        match self.child.wait().await {
            Ok(status) => status.code().unwrap_or(-1),
            Err(_) => -1,
        }
    }

    async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}
