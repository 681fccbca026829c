//! Preview server child process lifecycle
//!
//! The child is owned by a single supervising task. That task publishes the
//! exit status on a watch channel and terminates the child when asked, so
//! readiness polling and shutdown both observe the same exit without racing.

use crate::config::ServerConfig;
use crate::supervisor::tail::{capture_stream, snapshot, LogTail, SharedTail};
use crate::ExportError;
use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// How long the child gets to exit after SIGTERM before it is killed
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// How long capture tasks may keep draining after the child exits
///
/// A grandchild that inherited the pipes can keep them open after the
/// direct child is gone.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// How a child process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,

    /// Human-readable status (`exit status: 3`, `signal: 15 (SIGTERM)`, ...)
    pub description: String,
}

impl ProcessExit {
    fn from_status(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            description: status.to_string(),
        }
    }

    fn unknown(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            description: reason.into(),
        }
    }

    /// Returns true if the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Read side of the exit-status channel
#[derive(Debug, Clone)]
pub struct ExitWatch(watch::Receiver<Option<ProcessExit>>);

impl ExitWatch {
    /// The exit status, if the process has already exited
    pub fn exited(&self) -> Option<ProcessExit> {
        (*self.0.borrow()).clone()
    }

    /// Waits until the process has exited
    pub async fn wait(&mut self) -> ProcessExit {
        match self.0.wait_for(Option::is_some).await {
            Ok(status) => (*status)
                .clone()
                .unwrap_or_else(|| ProcessExit::unknown("exit status unavailable")),
            Err(_) => ProcessExit::unknown("supervisor task ended without a status"),
        }
    }
}

/// Snapshot of the captured stdout/stderr tails
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTails {
    pub stdout: String,
    pub stderr: String,
}

/// A running preview server
///
/// Dropping the handle without calling [`ServerProcess::shutdown`] still
/// terminates the child, but does not wait for it.
pub struct ServerProcess {
    command: String,
    pid: Option<u32>,
    exit: ExitWatch,
    kill_tx: Option<oneshot::Sender<()>>,
    supervisor: Option<JoinHandle<()>>,
    stdout_task: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<()>>,
    stdout_tail: SharedTail,
    stderr_tail: SharedTail,
}

impl ServerProcess {
    /// Spawns the preview server with both output streams captured
    ///
    /// # Arguments
    ///
    /// * `config` - Command, arguments and working directory of the server
    /// * `tail_bytes` - Byte budget of each of the stdout/stderr tails
    ///
    /// # Returns
    ///
    /// * `Ok(ServerProcess)` - The child is running and being captured
    /// * `Err(ExportError::Spawn)` - The program could not be started
    pub fn start(config: &ServerConfig, tail_bytes: usize) -> Result<Self, ExportError> {
        let command = describe_command(config);

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .current_dir(&config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExportError::Spawn {
                command: command.clone(),
                source,
            })?;

        let pid = child.id();
        tracing::info!("Started preview server `{}` (pid {:?})", command, pid);

        let stdout_tail = LogTail::shared(tail_bytes);
        let stderr_tail = LogTail::shared(tail_bytes);

        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(capture_stream(out, stdout_tail.clone(), "stdout")));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(capture_stream(err, stderr_tail.clone(), "stderr")));

        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(child, kill_rx, exit_tx));

        Ok(Self {
            command,
            pid,
            exit: ExitWatch(exit_rx),
            kill_tx: Some(kill_tx),
            supervisor: Some(supervisor),
            stdout_task,
            stderr_task,
            stdout_tail,
            stderr_tail,
        })
    }

    /// A watch on the exit status, for readiness polling
    pub fn exit_watch(&self) -> ExitWatch {
        self.exit.clone()
    }

    /// The exit status, if the server has already exited
    pub fn has_exited(&self) -> Option<ProcessExit> {
        self.exit.exited()
    }

    /// Current contents of both output tails
    pub fn tails(&self) -> LogTails {
        LogTails {
            stdout: snapshot(&self.stdout_tail),
            stderr: snapshot(&self.stderr_tail),
        }
    }

    /// Terminates the server and waits for it and its capture tasks
    ///
    /// A server that already exited is not an error; its recorded status is
    /// returned. Safe to call more than once.
    pub async fn shutdown(&mut self) -> Result<ProcessExit, ExportError> {
        if let Some(kill_tx) = self.kill_tx.take() {
            if let Some(status) = self.exit.exited() {
                tracing::debug!("Preview server `{}` already exited ({})", self.command, status);
            } else {
                tracing::info!(
                    "Stopping preview server `{}` (pid {:?})",
                    self.command,
                    self.pid
                );
            }
            // The supervisor may have finished already; a closed channel is fine.
            let _ = kill_tx.send(());
        }

        if let Some(supervisor) = self.supervisor.take() {
            supervisor.await?;
        }

        let status = self.exit.wait().await;

        for task in [self.stdout_task.take(), self.stderr_task.take()]
            .into_iter()
            .flatten()
        {
            drain(task).await?;
        }

        tracing::debug!("Preview server stopped ({})", status);
        Ok(status)
    }
}

/// Owns the child until it exits or termination is requested
async fn supervise(
    mut child: Child,
    kill_rx: oneshot::Receiver<()>,
    exit_tx: watch::Sender<Option<ProcessExit>>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill_rx => terminate(&mut child).await,
    };

    let exit = match status {
        Ok(status) => ProcessExit::from_status(status),
        Err(e) => ProcessExit::unknown(format!("failed to wait for server: {}", e)),
    };

    let _ = exit_tx.send(Some(exit));
}

/// SIGTERM first, then a hard kill after the grace period
async fn terminate(child: &mut Child) -> std::io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    if !send_sigterm(child.id()).await {
        child.kill().await?;
        return child.wait().await;
    }

    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            tracing::warn!(
                "Preview server ignored SIGTERM for {:?}, killing it",
                TERMINATE_GRACE
            );
            child.kill().await?;
            child.wait().await
        }
    }
}

#[cfg(unix)]
async fn send_sigterm(pid: Option<u32>) -> bool {
    let Some(pid) = pid else {
        return false;
    };

    match Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            tracing::debug!("Failed to run kill for pid {}: {}", pid, e);
            false
        }
    }
}

#[cfg(not(unix))]
async fn send_sigterm(_pid: Option<u32>) -> bool {
    false
}

/// Waits for a capture task, aborting it if the pipe never closes
async fn drain(mut task: JoinHandle<()>) -> Result<(), ExportError> {
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut task).await {
        Ok(joined) => Ok(joined?),
        Err(_) => {
            tracing::warn!("Server output still open after exit, stopping capture");
            task.abort();
            Ok(())
        }
    }
}

fn describe_command(config: &ServerConfig) -> String {
    std::iter::once(config.command.as_str())
        .chain(config.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
