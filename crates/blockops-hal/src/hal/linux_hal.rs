//! Linux HAL implementation using real processes.

use super::{CommandSpec, IdentityOps, ProcessOps, UserIdentity};
use crate::{HalError, HalResult};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// How long a timed-out command gets to exit after SIGTERM before SIGKILL.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal;

impl LinuxHal {
    pub fn new() -> Self {
        Self
    }
}

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(spec: &CommandSpec) -> HalResult<Output> {
    let program = spec.program.as_str();
    let mut cmd = Command::new(program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Own process group, so a timeout reaches the escalated command too.
        .process_group(0);
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(spec.timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            terminate_group(&mut child);
            // Processes that left the group may still hold the pipes open;
            // the drain threads are detached rather than joined.
            drop(stdout_handle);
            drop(stderr_handle);
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: spec.timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

/// SIGTERM the child's process group, then SIGKILL whatever is left after
/// [`TERM_GRACE`]. `sudo` relays SIGTERM to the command it runs.
fn terminate_group(child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(err) = killpg(pgid, Signal::SIGTERM) {
        log::debug!("killpg({}, SIGTERM): {}", pgid, err);
    }
    let exited = matches!(child.wait_timeout(TERM_GRACE), Ok(Some(_)));
    // ESRCH here just means the group is already gone.
    let _ = killpg(pgid, Signal::SIGKILL);
    if !exited {
        let _ = child.wait();
    }
}

impl ProcessOps for LinuxHal {
    fn command_output(&self, spec: &CommandSpec) -> HalResult<String> {
        log::debug!("exec: {}", spec);
        let output = output_with_timeout(spec)?;
        if !output.status.success() {
            return Err(output_failed(&spec.program, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl IdentityOps for LinuxHal {
    fn current_user(&self) -> HalResult<UserIdentity> {
        let uid = nix::unistd::getuid();
        let user = nix::unistd::User::from_uid(uid)?
            .ok_or_else(|| HalError::Other(format!("no passwd entry for uid {}", uid)))?;
        Ok(UserIdentity {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
        })
    }
}
