//! An engine child process owned by the gateway.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Time an engine gets to exit after SIGTERM before it is killed.
const ENGINE_STOP_GRACE: Duration = Duration::from_secs(5);

/// Engine child process, stopped when the gateway shuts down.
///
/// The child is spawned with `kill_on_drop`, so a gateway that exits
/// without calling [`ManagedProcess::shutdown`] still does not leak it.
#[derive(Debug)]
pub struct ManagedProcess {
    label: &'static str,
    pid: Option<u32>,
    grace: Duration,
    child: Mutex<Option<Child>>,
}

impl ManagedProcess {
    pub fn new(label: &'static str, child: Child) -> Self {
        Self {
            label,
            pid: child.id(),
            grace: ENGINE_STOP_GRACE,
            child: Mutex::new(Some(child)),
        }
    }

    pub const fn label(&self) -> &'static str {
        self.label
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit status if the process has already terminated.
    pub async fn exit_status(&self) -> Option<ExitStatus> {
        let mut guard = self.child.lock().await;
        let child = guard.as_mut()?;
        match child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                debug!(engine = self.label, "try_wait failed: {e}");
                None
            }
        }
    }

    /// Stop the process and reap it.
    ///
    /// Returns the exit status on the first call. Later calls, and calls
    /// where the process could not be reaped, return `None`.
    pub async fn shutdown(&self) -> Option<ExitStatus> {
        let mut child = self.child.lock().await.take()?;

        info!(engine = self.label, pid = ?self.pid, "Stopping engine process");
        match self.terminate(&mut child).await {
            Ok(status) => {
                debug!(engine = self.label, %status, "Engine process exited");
                Some(status)
            }
            Err(e) => {
                warn!(engine = self.label, "Failed to stop engine process: {e}");
                None
            }
        }
    }

    /// SIGTERM, wait out the grace period, then SIGKILL.
    #[cfg(unix)]
    async fn terminate(&self, child: &mut Child) -> io::Result<ExitStatus> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Some(pid) = child.id() else {
            return child.wait().await;
        };
        let pid = i32::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => {}
            // Exited between `id()` and the signal
            Err(Errno::ESRCH) => return child.wait().await,
            Err(e) => return Err(io::Error::other(e)),
        }

        if let Ok(status) = tokio::time::timeout(self.grace, child.wait()).await {
            return status;
        }

        warn!(
            engine = self.label,
            grace_secs = self.grace.as_secs_f32(),
            "Engine ignored SIGTERM, killing"
        );
        child.kill().await?;
        child.wait().await
    }

    #[cfg(not(unix))]
    async fn terminate(&self, child: &mut Child) -> io::Result<ExitStatus> {
        child.kill().await?;
        child.wait().await
    }
}
