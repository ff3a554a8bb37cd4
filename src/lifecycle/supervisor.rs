//! Upstream child process supervision.
//!
//! # Responsibilities
//! - Spawn the upstream service once at startup
//! - Log its exit, whenever that happens
//! - Terminate it on shutdown: SIGTERM, grace period, then kill
//!
//! # Design Decisions
//! - The child is owned by a watcher task; `stop()` asks that task to
//!   terminate it, so exit logging and termination never race
//! - `kill_on_drop` covers the parent exiting without calling `stop()`

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::SupervisorConfig;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to spawn upstream `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upstream watcher task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

struct Running {
    pid: Option<u32>,
    stop_tx: oneshot::Sender<()>,
    watcher: JoinHandle<Option<ExitStatus>>,
}

/// Owns the upstream child process.
pub struct UpstreamSupervisor {
    config: SupervisorConfig,
    running: Option<Running>,
}

impl UpstreamSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }

    /// Spawn the upstream. Does nothing if it is already running.
    pub fn start(&mut self) -> Result<(), SupervisorError> {
        if self.is_running() {
            return Ok(());
        }

        let child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        let pid = child.id();
        tracing::info!(
            pid = ?pid,
            command = %self.config.command,
            args = ?self.config.args,
            "Upstream started"
        );

        let (stop_tx, stop_rx) = oneshot::channel();
        let grace = Duration::from_secs(self.config.stop_timeout_secs);
        let watcher = tokio::spawn(watch(child, stop_rx, grace));

        self.running = Some(Running {
            pid,
            stop_tx,
            watcher,
        });
        Ok(())
    }

    /// Whether the child is still alive.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.watcher.is_finished())
    }

    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().and_then(|running| running.pid)
    }

    /// Terminate the child and wait for it. Returns its exit status, or
    /// `None` if nothing was running. Safe to call repeatedly.
    pub async fn stop(&mut self) -> Result<Option<ExitStatus>, SupervisorError> {
        let Some(running) = self.running.take() else {
            return Ok(None);
        };

        tracing::info!(pid = ?running.pid, "Shutting down upstream");
        // The watcher may already have seen the child exit.
        let _ = running.stop_tx.send(());
        Ok(running.watcher.await?)
    }
}

async fn watch(
    mut child: Child,
    stop_rx: oneshot::Receiver<()>,
    grace: Duration,
) -> Option<ExitStatus> {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                log_exit(&status);
                Some(status)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to wait for upstream");
                None
            }
        },
        _ = stop_rx => {
            let status = terminate(&mut child, grace).await;
            if let Some(status) = &status {
                log_exit(status);
            }
            status
        }
    }
}

async fn terminate(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    send_terminate(child);

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to wait for upstream");
            None
        }
        Err(_) => {
            tracing::warn!(grace = ?grace, "Upstream did not exit in time, killing");
            if let Err(e) = child.kill().await {
                tracing::error!(error = %e, "Failed to kill upstream");
            }
            child.wait().await.ok()
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    if let Some(id) = child.id() {
        if let Err(e) = signal::kill(Pid::from_raw(id as i32), Signal::SIGTERM) {
            tracing::error!(pid = id, error = %e, "Failed to send SIGTERM to upstream");
        }
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::error!(error = %e, "Failed to stop upstream");
    }
}

fn log_exit(status: &ExitStatus) {
    #[cfg(unix)]
    let signal = std::os::unix::process::ExitStatusExt::signal(status);
    #[cfg(not(unix))]
    let signal: Option<i32> = None;

    tracing::info!(code = ?status.code(), signal = ?signal, "Upstream exited");
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;
    use std::os::unix::process::ExitStatusExt;

    fn config(command: &str, args: &[&str]) -> SupervisorConfig {
        SupervisorConfig {
            enabled: true,
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            stop_timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn stop_terminates_with_sigterm() {
        let mut supervisor = UpstreamSupervisor::new(config("sleep", &["30"]));
        supervisor.start().unwrap();
        assert!(supervisor.is_running());
        assert!(supervisor.pid().is_some());

        let status = supervisor.stop().await.unwrap().expect("exit status");
        assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut supervisor = UpstreamSupervisor::new(config("sleep", &["30"]));
        assert!(supervisor.stop().await.unwrap().is_none());

        supervisor.start().unwrap();
        assert!(supervisor.stop().await.unwrap().is_some());
        assert!(supervisor.stop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn child_exit_is_observed() {
        let mut supervisor = UpstreamSupervisor::new(config("true", &[]));
        supervisor.start().unwrap();

        for _ in 0..50 {
            if !supervisor.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!supervisor.is_running());

        let status = supervisor.stop().await.unwrap().expect("exit status");
        assert!(status.success());
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let mut supervisor =
            UpstreamSupervisor::new(config("/nonexistent/edge-gateway-upstream", &[]));
        let err = supervisor.start().unwrap_err();
        assert!(matches!(err, SupervisorError::Spawn { .. }));
        assert!(!supervisor.is_running());
    }
}
