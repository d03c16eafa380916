//! Process management utilities

use autostarter_api::LoadoutEntry;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::borrow::Cow;
use std::io::ErrorKind;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

use autostarter_host_api::{ExitStatus, HostError, HostResult};

/// Interval between exit checks while waiting on a child
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Managed child process with process group
pub struct ManagedProcess {
    pub child: Child,
    pub pid: u32,
    pub pgid: u32,
}

impl ManagedProcess {
    /// Spawn a loadout entry in its own process group
    ///
    /// The child inherits the environment, with the entry's `env` layered on
    /// top. Standard streams are detached.
    pub fn spawn(entry: &LoadoutEntry) -> HostResult<Self> {
        if entry.path.is_empty() {
            return Err(HostError::SpawnFailed("Empty program path".into()));
        }

        // std reports a missing cwd as ENOENT, indistinguishable from a
        // missing program, so check it up front.
        if let Some(dir) = &entry.cwd
            && !dir.is_dir()
        {
            return Err(HostError::NotFound(format!(
                "Working directory {} does not exist",
                dir.display()
            )));
        }

        let mut cmd = Command::new(&entry.path);
        cmd.args(&entry.args);
        cmd.envs(&entry.env);

        if let Some(dir) = &entry.cwd {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                // New session, so the child leads its own process group
                nix::unistd::setsid().map_err(|e| std::io::Error::other(e.to_string()))?;
                Ok(())
            });
        }

        let child = cmd.spawn().map_err(|e| {
            let message = format!("Failed to spawn {}: {}", entry.path, e);
            match e.kind() {
                ErrorKind::PermissionDenied => HostError::PermissionDenied(message),
                _ => HostError::SpawnFailed(message),
            }
        })?;

        let pid = child.id();
        let pgid = pid; // After setsid, pid == pgid

        debug!(
            pid = pid,
            pgid = pgid,
            command = %command_line(entry),
            "Process spawned"
        );

        Ok(Self { child, pid, pgid })
    }

    /// Send SIGTERM to the process group
    pub fn terminate(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGTERM)
    }

    /// Send SIGKILL to the process group
    pub fn kill(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGKILL)
    }

    fn signal_group(&self, sig: Signal) -> HostResult<()> {
        let pgid = Pid::from_raw(-(self.pgid as i32)); // Negative for process group

        match signal::kill(pgid, sig) {
            Ok(()) => {
                debug!(pgid = self.pgid, signal = %sig, "Signalled process group");
                Ok(())
            }
            Err(nix::errno::Errno::ESRCH) => {
                // Process group already gone
                Ok(())
            }
            Err(e) => Err(HostError::StopFailed(format!("Failed to send {}: {}", sig, e))),
        }
    }

    /// Check if the process has exited (non-blocking)
    pub fn try_wait(&mut self) -> HostResult<Option<ExitStatus>> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                let exit_status = match (status.code(), status.signal()) {
                    (Some(code), _) => ExitStatus::with_code(code),
                    (None, Some(sig)) => ExitStatus::signaled(sig),
                    (None, None) => ExitStatus::with_code(-1),
                };
                Ok(Some(exit_status))
            }
            Ok(None) => Ok(None), // Still running
            Err(e) => Err(HostError::Internal(format!("Wait failed: {}", e))),
        }
    }

    /// Poll for exit until `timeout` elapses; `Ok(None)` if still running
    pub fn wait_timeout(&mut self, timeout: Duration) -> HostResult<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            if start.elapsed() >= timeout {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Shell-quoted command line, for logs
pub fn command_line(entry: &LoadoutEntry) -> String {
    entry
        .argv()
        .into_iter()
        .map(|arg| shell_escape::escape(Cow::Owned(arg)).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn spawn_simple_process() {
        let mut proc = ManagedProcess::spawn(&LoadoutEntry::new("true")).unwrap();

        let status = proc.wait_timeout(WAIT).unwrap().unwrap();
        assert!(status.is_success());
        assert_eq!(proc.pid, proc.pgid);
    }

    #[test]
    fn spawn_with_args_env_and_cwd() {
        let entry = LoadoutEntry::new("sh")
            .with_args(["-c", r#"test "$AUTOSTARTER_TEST" = yes && test "$(pwd)" = /"#])
            .with_env("AUTOSTARTER_TEST", "yes")
            .with_cwd("/");

        let mut proc = ManagedProcess::spawn(&entry).unwrap();
        let status = proc.wait_timeout(WAIT).unwrap().unwrap();
        assert!(status.is_success());
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let result = ManagedProcess::spawn(&LoadoutEntry::new("/does/not/exist"));
        assert!(matches!(result, Err(HostError::SpawnFailed(_))));
    }

    #[test]
    fn missing_cwd_is_not_found() {
        let entry = LoadoutEntry::new("true").with_cwd("/does/not/exist");
        let result = ManagedProcess::spawn(&entry);
        assert!(matches!(result, Err(HostError::NotFound(_))));
    }

    #[test]
    fn non_executable_is_permission_denied() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-executable");
        std::fs::write(&file, "#!/bin/sh\nexit 0\n").unwrap();
        let path = file.to_string_lossy().into_owned();

        let result = ManagedProcess::spawn(&LoadoutEntry::new(path));
        assert!(matches!(result, Err(HostError::PermissionDenied(_))));
    }

    #[test]
    fn terminate_sleeping_process() {
        let mut proc = ManagedProcess::spawn(&LoadoutEntry::new("sleep").with_args(["60"])).unwrap();
        assert!(proc.try_wait().unwrap().is_none());

        proc.terminate().unwrap();

        let status = proc.wait_timeout(WAIT).unwrap().unwrap();
        assert_eq!(status.signal, Some(Signal::SIGTERM as i32));
    }

    #[test]
    fn command_line_quotes_arguments() {
        let entry = LoadoutEntry::new("/opt/my tool/run").with_args(["--title", "Hello World"]);
        assert_eq!(command_line(&entry), "'/opt/my tool/run' --title 'Hello World'");
    }
}
