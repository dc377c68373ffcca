//! Lifecycle and request handling for the shared kernel process.

use std::process::Stdio;
use std::sync::{Mutex as StdMutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::memory::MemoryInfo;
use crate::protocol::{KernelCommand, KernelReply};
use crate::types::{ExecutionResult, KernelState, KernelStatus, VariableInfo, WorkspaceInfo};

/// Time a kernel gets to exit after a shutdown request before it is killed.
const STOP_GRACE: Duration = Duration::from_secs(5);

struct KernelProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl KernelProcess {
    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    async fn request(&mut self, cmd: &KernelCommand, timeout: Duration) -> Result<KernelReply> {
        self.stdin.write_all(cmd.to_line()?.as_bytes()).await?;
        self.stdin.flush().await?;
        tokio::time::timeout(timeout, self.read_reply())
            .await
            .map_err(|_| KernelError::Timeout(timeout.as_secs()))?
    }

    /// Next line that decodes as a reply; anything else the interpreter
    /// printed outside a cell (import banners and the like) is logged.
    async fn read_reply(&mut self) -> Result<KernelReply> {
        while let Some(line) = self.stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<KernelReply>(line) {
                Ok(reply) => return Ok(reply),
                Err(_) => debug!(line, "kernel stdout"),
            }
        }
        Err(KernelError::Eof)
    }
}

#[derive(Debug)]
struct KernelMeta {
    state: KernelState,
    pid: Option<u32>,
    started_at: Option<Instant>,
    executions_count: u64,
    last_execution_time: Option<f64>,
}

/// Owns the kernel process and serialises every request to it.
pub struct KernelManager {
    config: KernelConfig,
    process: Mutex<Option<KernelProcess>>,
    meta: StdMutex<KernelMeta>,
}

impl KernelManager {
    /// Create a manager; the process is started on first use.
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            process: Mutex::new(None),
            meta: StdMutex::new(KernelMeta {
                state: KernelState::Dead,
                pid: None,
                started_at: None,
                executions_count: 0,
                last_execution_time: None,
            }),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn meta(&self) -> MutexGuard<'_, KernelMeta> {
        self.meta.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: KernelState) {
        self.meta().state = state;
    }

    fn mark_dead(&self) {
        let mut meta = self.meta();
        meta.state = KernelState::Dead;
        meta.pid = None;
        meta.started_at = None;
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs.max(1))
    }

    fn spawn(&self) -> Result<KernelProcess> {
        let (program, args) = self.config.command();
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(KernelError::Spawn)?;

        let stdin = child.stdin.take().ok_or(KernelError::NotRunning)?;
        let stdout = child.stdout.take().ok_or(KernelError::NotRunning)?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "neutronote_kernel::stderr", "{}", line);
                }
            });
        }

        Ok(KernelProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Start the process in `slot` unless one is already running.
    fn start_locked(&self, slot: &mut Option<KernelProcess>) -> Result<()> {
        if let Some(process) = slot.as_mut() {
            if !process.has_exited() {
                return Ok(());
            }
            warn!("kernel process exited unexpectedly");
        }
        *slot = None;
        self.set_state(KernelState::Starting);

        match self.spawn() {
            Ok(process) => {
                let pid = process.child.id();
                *slot = Some(process);
                let mut meta = self.meta();
                meta.state = KernelState::Idle;
                meta.pid = pid;
                meta.started_at = Some(Instant::now());
                meta.executions_count = 0;
                info!(pid, "kernel started");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to start kernel");
                self.mark_dead();
                Err(e)
            }
        }
    }

    async fn discard(&self, slot: &mut Option<KernelProcess>) {
        if let Some(mut process) = slot.take() {
            let _ = process.child.kill().await;
        }
        self.mark_dead();
    }

    pub async fn start(&self) -> Result<()> {
        let mut slot = self.process.lock().await;
        self.start_locked(&mut slot)
    }

    /// Ask the kernel to shut down, killing it if it does not exit in time.
    pub async fn stop(&self) {
        let mut slot = self.process.lock().await;
        if let Some(process) = slot.take() {
            let KernelProcess { mut child, mut stdin, .. } = process;
            if let Ok(line) = KernelCommand::Shutdown.to_line() {
                let _ = stdin.write_all(line.as_bytes()).await;
                let _ = stdin.flush().await;
            }
            drop(stdin);

            if tokio::time::timeout(STOP_GRACE, child.wait()).await.is_err() {
                warn!("kernel ignored shutdown, killing");
                let _ = child.kill().await;
            }
            info!("kernel stopped");
        }
        self.mark_dead();
    }

    pub async fn restart(&self) -> Result<()> {
        self.stop().await;
        self.start().await
    }

    pub fn is_alive(&self) -> bool {
        let Ok(mut slot) = self.process.try_lock() else {
            // Held by an in-flight request.
            return true;
        };
        let alive = match slot.as_mut() {
            Some(process) => !process.has_exited(),
            None => false,
        };
        if !alive && slot.is_some() {
            *slot = None;
            self.mark_dead();
        }
        alive
    }

    pub fn status(&self) -> KernelStatus {
        let alive = self.is_alive();
        let meta = self.meta();
        KernelStatus {
            state: if alive { meta.state } else { KernelState::Dead },
            pid: meta.pid,
            uptime_seconds: match meta.started_at {
                Some(at) if alive => at.elapsed().as_secs_f64(),
                _ => 0.0,
            },
            executions_count: meta.executions_count,
            last_execution_time: meta.last_execution_time,
        }
    }

    /// Run a code cell, starting the kernel if necessary.
    pub async fn execute(&self, code: &str) -> ExecutionResult {
        let mut slot = self.process.lock().await;
        if self.start_locked(&mut slot).is_err() {
            return ExecutionResult::failure("Kernel is not running and failed to start", 0.0);
        }
        let Some(process) = slot.as_mut() else {
            return ExecutionResult::failure("Kernel is not running and failed to start", 0.0);
        };

        self.set_state(KernelState::Busy);
        let started = Instant::now();
        let cmd = KernelCommand::Execute {
            code: code.to_string(),
        };
        let reply = process.request(&cmd, self.timeout()).await;
        let elapsed = started.elapsed().as_secs_f64();

        match reply {
            Ok(KernelReply::Result {
                success,
                output,
                error,
            }) => {
                {
                    let mut meta = self.meta();
                    meta.state = KernelState::Idle;
                    meta.executions_count += 1;
                    meta.last_execution_time = Some(elapsed);
                }
                debug!(success, elapsed, "cell executed");
                ExecutionResult::from_reply(success, output, error, elapsed)
            }
            Ok(KernelReply::Error { error }) => {
                self.set_state(KernelState::Idle);
                ExecutionResult::failure(error, elapsed)
            }
            Ok(other) => {
                self.set_state(KernelState::Idle);
                warn!(?other, "unexpected reply to execute");
                ExecutionResult::failure("Unexpected reply from kernel", elapsed)
            }
            Err(e) => {
                warn!(error = %e, "kernel did not answer");
                self.discard(&mut slot).await;
                ExecutionResult::failure("No response from kernel", elapsed)
            }
        }
    }

    /// Send a request to a running kernel. Never starts one.
    async fn request(&self, cmd: KernelCommand) -> Option<KernelReply> {
        let mut slot = self.process.lock().await;
        let alive = match slot.as_mut() {
            Some(process) => !process.has_exited(),
            None => false,
        };
        if !alive {
            return None;
        }
        let process = slot.as_mut()?;
        let reply = process.request(&cmd, self.timeout()).await;
        match reply {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(error = %e, ?cmd, "kernel request failed");
                self.discard(&mut slot).await;
                None
            }
        }
    }

    pub async fn ping(&self) -> bool {
        matches!(self.request(KernelCommand::Ping).await, Some(KernelReply::Pong))
    }

    pub async fn workspaces(&self) -> Vec<WorkspaceInfo> {
        match self.request(KernelCommand::Workspaces).await {
            Some(KernelReply::Workspaces { workspaces }) => workspaces,
            _ => Vec::new(),
        }
    }

    pub async fn variables(&self) -> Vec<VariableInfo> {
        match self.request(KernelCommand::Variables).await {
            Some(KernelReply::Variables { variables }) => variables,
            _ => Vec::new(),
        }
    }

    /// Remove a workspace from the kernel. Returns success and a message
    /// suitable for display.
    pub async fn delete_workspace(&self, name: &str) -> (bool, String) {
        if !self.is_alive() {
            return (false, "Kernel is not running".to_string());
        }
        if name.trim().is_empty() {
            return (false, "Workspace name is required".to_string());
        }

        let cmd = KernelCommand::DeleteWorkspace {
            name: name.to_string(),
        };
        match self.request(cmd).await {
            Some(KernelReply::Deleted { success: true, .. }) => {
                info!(workspace = name, "workspace deleted");
                (true, format!("Workspace '{name}' deleted"))
            }
            Some(KernelReply::Deleted { error, .. }) => {
                (false, error.unwrap_or_else(|| "Unknown error".to_string()))
            }
            Some(KernelReply::Error { error }) => (false, error),
            Some(_) => (false, "Unknown error".to_string()),
            None => (false, "Failed to communicate with kernel".to_string()),
        }
    }

    /// Host memory figures plus the memory held by kernel workspaces.
    pub async fn memory_info(&self) -> MemoryInfo {
        let mantid_mb = match self.request(KernelCommand::Memory).await {
            Some(KernelReply::Memory { mantid_mb }) => mantid_mb,
            _ => 0.0,
        };
        MemoryInfo::sample(mantid_mb)
    }
}
