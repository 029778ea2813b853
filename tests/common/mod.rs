// Common test utilities: a scripted sandbox double for session tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use devstudio::session::{ProcessStream, Sandbox, SandboxProcess, ServerReady};

/// One recorded sandbox operation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Op {
    Mkdir(String),
    Write(String),
    Spawn(String),
}

/// Scripted behavior for one spawned process.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct ProcessScript {
    pub lines: Vec<(ProcessStream, String)>,
    pub exit_code: i32,
    /// Readiness signals emitted while streaming, one per line poll.
    pub ready_signals: Vec<ServerReady>,
    /// Keep the process alive after its lines run out, until killed.
    pub hang_after_lines: bool,
}

#[allow(dead_code)]
impl ProcessScript {
    pub fn exiting(lines: &[(ProcessStream, &str)], exit_code: i32) -> Self {
        Self {
            lines: lines.iter().map(|(s, l)| (*s, l.to_string())).collect(),
            exit_code,
            ..Self::default()
        }
    }

    pub fn server(url: &str, port: u16) -> Self {
        Self {
            lines: vec![(ProcessStream::Stdout, format!("  Local: {url}"))],
            ready_signals: vec![ServerReady {
                port,
                url: url.to_string(),
            }],
            hang_after_lines: true,
            ..Self::default()
        }
    }
}

/// Sandbox double that records operations and replays process scripts in
/// spawn order.
#[derive(Default)]
pub struct FakeSandbox {
    pub ops: Arc<Mutex<Vec<Op>>>,
    pub boot_fails: bool,
    /// Paths whose mount writes fail.
    pub failing_writes: Vec<String>,
    scripts: Mutex<VecDeque<ProcessScript>>,
    ready_subscribers: Mutex<Vec<mpsc::UnboundedSender<ServerReady>>>,
}

#[allow(dead_code)]
impl FakeSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boot_failure(mut self) -> Self {
        self.boot_fails = true;
        self
    }

    pub fn with_failing_writes(mut self, paths: &[&str]) -> Self {
        self.failing_writes = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn push_script(&self, script: ProcessScript) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn recorded_ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl Sandbox for FakeSandbox {
    async fn boot(&self) -> anyhow::Result<()> {
        if self.boot_fails {
            anyhow::bail!("sandbox capability unavailable")
        }
        Ok(())
    }

    async fn mkdir_recursive(&self, path: &str) -> std::io::Result<()> {
        self.record(Op::Mkdir(path.to_string()));
        Ok(())
    }

    async fn write_file(&self, path: &str, _contents: &str) -> std::io::Result<()> {
        self.record(Op::Write(path.to_string()));
        if self.failing_writes.iter().any(|p| p == path) {
            return Err(std::io::Error::other("simulated write failure"));
        }
        Ok(())
    }

    async fn spawn(
        &self,
        command: &str,
        args: &[String],
    ) -> anyhow::Result<Box<dyn SandboxProcess>> {
        let mut rendered = command.to_string();
        for arg in args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        self.record(Op::Spawn(rendered));

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        Ok(Box::new(FakeProcess {
            lines: script.lines.into(),
            exit_code: script.exit_code,
            ready_signals: script.ready_signals.into(),
            hang_after_lines: script.hang_after_lines,
            killed: false,
            ready_senders: self.ready_subscribers.lock().unwrap().clone(),
        }))
    }

    fn subscribe_server_ready(&self) -> mpsc::UnboundedReceiver<ServerReady> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.ready_subscribers.lock().unwrap().push(tx);
        rx
    }
}

struct FakeProcess {
    lines: VecDeque<(ProcessStream, String)>,
    exit_code: i32,
    ready_signals: VecDeque<ServerReady>,
    hang_after_lines: bool,
    killed: bool,
    ready_senders: Vec<mpsc::UnboundedSender<ServerReady>>,
}

#[async_trait]
impl SandboxProcess for FakeProcess {
    async fn next_line(&mut self) -> Option<(ProcessStream, String)> {
        if let Some(ready) = self.ready_signals.pop_front() {
            for sender in &self.ready_senders {
                let _ = sender.send(ready.clone());
            }
        }

        match self.lines.pop_front() {
            Some(line) => Some(line),
            None if self.hang_after_lines && !self.killed => {
                // Long-lived process: pend until the runtime kills us.
                std::future::pending::<()>().await;
                None
            }
            None => None,
        }
    }

    async fn wait(&mut self) -> i32 {
        self.exit_code
    }

    async fn kill(&mut self) {
        self.killed = true;
    }
}
