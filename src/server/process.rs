// src/server/process.rs
use crate::error::{Error, Result};
use crate::server::LaunchArgs;
use async_process::{Child, Command, Stdio};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

/// Resolves a script path to an absolute path and checks that it exists.
pub fn resolve_script(script: impl AsRef<Path>) -> Result<PathBuf> {
    let script = script.as_ref();
    let absolute = std::path::absolute(script)
        .map_err(|e| Error::Process(format!("Failed to resolve '{}': {}", script.display(), e)))?;

    if !absolute.is_file() {
        return Err(Error::ScriptNotFound(absolute));
    }

    Ok(absolute)
}

/// Arguments passed after the interpreter: the script, the port as first
/// positional argument, then the long-form flags.
pub fn command_args(script: &Path, port: u16, args: &LaunchArgs) -> Vec<String> {
    let mut argv = vec![script.display().to_string(), port.to_string()];
    argv.extend(args.to_cli_args());
    argv
}

/// A launched tool server process together with its log file.
///
/// The child handle and the log stream live and die together: both are
/// owned here and [`release`](ServerProcess::release) gives both up at once.
pub struct ServerProcess {
    /// Child process
    child: Child,
    /// Log file receiving stdout and stderr
    log: File,
    /// OS process id, captured at spawn time
    pid: u32,
}

impl ServerProcess {
    /// Spawns `interpreter script port [--key value ...]`.
    ///
    /// The working directory is the script's own directory and both output
    /// streams go to `log_file`, which is created or truncated first.
    pub fn launch(
        interpreter: &str,
        script: &Path,
        port: u16,
        args: &LaunchArgs,
        log_file: &Path,
    ) -> Result<Self> {
        let log = File::create(log_file).map_err(|e| {
            Error::Process(format!(
                "Failed to open log file '{}': {}",
                log_file.display(),
                e
            ))
        })?;
        let stdout = log
            .try_clone()
            .map_err(|e| Error::Process(format!("Failed to clone log handle: {}", e)))?;
        let stderr = log
            .try_clone()
            .map_err(|e| Error::Process(format!("Failed to clone log handle: {}", e)))?;

        let mut command = Command::new(interpreter);
        command.args(command_args(script, port, args));

        if let Some(dir) = script.parent() {
            command.current_dir(dir);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        let child = command
            .spawn()
            .map_err(|e| Error::Process(format!("Failed to start process: {}", e)))?;
        let pid = child.id();

        tracing::debug!(pid, port, script = %script.display(), "Spawned server process");

        Ok(Self { child, log, pid })
    }

    /// Get the OS process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Non-blocking poll: `Some(status)` once the process has exited.
    pub fn try_exit_status(&mut self) -> Result<Option<ExitStatus>> {
        self.child
            .try_status()
            .map_err(|e| Error::Process(format!("Failed to poll process: {}", e)))
    }

    /// Sends the platform's termination signal (SIGTERM on Unix).
    #[cfg(unix)]
    pub fn terminate(&mut self) -> Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let pid = i32::try_from(self.pid)
            .map_err(|_| Error::Process(format!("PID {} out of range", self.pid)))?;
        kill(Pid::from_raw(pid), Signal::SIGTERM)
            .map_err(|e| Error::Process(format!("Failed to signal process: {}", e)))
    }

    /// Sends the platform's termination signal.
    #[cfg(not(unix))]
    pub fn terminate(&mut self) -> Result<()> {
        self.child
            .kill()
            .map_err(|e| Error::Process(format!("Failed to terminate process: {}", e)))
    }

    /// Waits up to `timeout` for the process to exit; `None` on timeout.
    pub async fn wait(&mut self, timeout: Duration) -> Result<Option<ExitStatus>> {
        match tokio::time::timeout(timeout, self.child.status()).await {
            Ok(Ok(status)) => Ok(Some(status)),
            Ok(Err(e)) => Err(Error::Process(format!("Failed to wait for process: {}", e))),
            Err(_) => Ok(None),
        }
    }

    /// Gives up the child handle and closes the log stream.
    pub fn release(self) {
        let Self { child, log, pid } = self;
        if let Err(e) = log.sync_all() {
            tracing::trace!(pid, error = %e, "Failed to flush log file");
        }
        drop(log);
        drop(child);
    }
}
