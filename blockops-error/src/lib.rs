use std::io;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Failures reported by a command executor.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out: {program} after {timeout_secs}s")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("nix errno: {0}")]
    Nix(#[from] nix::errno::Errno),

    #[error("{0}")]
    Other(String),
}

impl HalError {
    /// Exit status of a command that ran to completion and failed.
    ///
    /// `None` if the process did not exit normally.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            HalError::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("command {label} failed: {source}")]
    Command {
        label: String,
        #[source]
        source: HalError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing --yes-i-know flag. This operation is destructive!")]
    MissingYesIKnow,
}

impl DeviceError {
    pub fn command(label: impl Into<String>, source: HalError) -> Self {
        DeviceError::Command {
            label: label.into(),
            source,
        }
    }
}
