//! Process execution helpers.
//!
//! External commands are considered "world-touching" and must go through the HAL so device
//! operations can be tested without spawning real processes.

use super::CommandSpec;
use crate::HalResult;

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run a command to completion and return its trimmed stdout.
    ///
    /// A non-zero exit is reported as [`crate::HalError::CommandFailed`] with the exit code.
    fn command_output(&self, spec: &CommandSpec) -> HalResult<String>;

    /// Run a command to completion, discarding its output.
    fn command_status(&self, spec: &CommandSpec) -> HalResult<()> {
        self.command_output(spec).map(|_| ())
    }
}
