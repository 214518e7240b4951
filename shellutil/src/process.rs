//! Helpers for running child processes and capturing their output.

use std::io::{self, Read};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::error::{Result, ShellError};

/// Captured child process output: exit code plus raw stdout/stderr bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn new(code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    fn from_status(status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>, timed_out: bool) -> Self {
        Self {
            code: status.code(),
            stdout,
            stderr,
            timed_out,
        }
    }

    /// True when the exit code is non-zero (or missing) or stderr is non-empty.
    pub fn failed(&self) -> bool {
        self.code != Some(0) || !self.stderr.is_empty()
    }
}

/// Run `cmd` to completion, capturing stdout/stderr without risking pipe deadlocks.
///
/// Output is drained on reader threads while the child runs. With a
/// `timeout` the child leads its own process group (on unix) and the whole
/// group is killed once it elapses, so processes started by a `sh -c`
/// wrapper cannot hold the pipes open. The result is then flagged
/// `timed_out`. `label` names the command in errors and logs.
#[instrument(skip_all, fields(command = label, timeout_secs = timeout.map(|t| t.as_secs())))]
pub fn run_command(
    mut cmd: Command,
    label: &str,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    if timeout.is_some() {
        cmd.process_group(0);
    }

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(spawn_error(label, e));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| spawn_error(label, io::Error::other("stdout was not piped")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| spawn_error(label, io::Error::other("stderr was not piped")))?;

    let stdout_handle = thread::spawn(move || read_stream(stdout));
    let stderr_handle = thread::spawn(move || read_stream(stderr));

    let (status, timed_out) = match wait_child(&mut child, timeout) {
        Ok(waited) => waited,
        Err(e) => {
            error!(err = %e, "waiting on child failed, killing");
            kill_child(&mut child);
            let _ = child.wait();
            return Err(spawn_error(label, e));
        }
    };

    let stdout = join_output(stdout_handle).map_err(|e| spawn_error(label, e))?;
    let stderr = join_output(stderr_handle).map_err(|e| spawn_error(label, e))?;

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput::from_status(status, stdout, stderr, timed_out))
}

fn wait_child(child: &mut Child, timeout: Option<Duration>) -> io::Result<(ExitStatus, bool)> {
    let Some(timeout) = timeout else {
        return Ok((child.wait()?, false));
    };
    match child.wait_timeout(timeout)? {
        Some(status) => Ok((status, false)),
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            kill_child(child);
            Ok((child.wait()?, true))
        }
    }
}

/// Kill the child's process group, falling back to the child alone when it
/// does not lead one.
#[cfg(unix)]
fn kill_child(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        debug!(err = %e, "killpg failed");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_child(child: &mut Child) {
    let _ = child.kill();
}

fn spawn_error(label: &str, source: io::Error) -> ShellError {
    ShellError::Spawn {
        command: label.to_string(),
        source,
    }
}

fn join_output(handle: thread::JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(io::Error::other("output reader thread panicked")),
    }
}

fn read_stream<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}
