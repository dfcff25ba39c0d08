//! Fake HAL implementation for testing.
//!
//! This implementation records all commands without executing them and replays
//! scripted output, allowing for CI-safe testing without root privileges or real hardware.

use super::{CommandSpec, IdentityOps, ProcessOps, UserIdentity};
use crate::{HalError, HalResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// Programs treated as privilege escalation prefixes when matching scripted responses.
const ESCALATION_PROGRAMS: &[&str] = &["sudo", "doas", "pkexec"];

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        program: String,
        args: Vec<String>,
        timeout_secs: u64,
    },
    CurrentUser,
}

/// Scripted result for a command.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Successful exit with the given stdout.
    Output(String),
    /// Non-zero exit.
    Exit { code: i32, stderr: String },
    /// The program could not be spawned.
    NotFound,
    /// The program ran past its deadline.
    Timeout,
}

impl FakeResponse {
    pub fn output(stdout: impl Into<String>) -> Self {
        FakeResponse::Output(stdout.into())
    }

    pub fn exit(code: i32) -> Self {
        FakeResponse::Exit {
            code,
            stderr: String::new(),
        }
    }

    fn into_result(self, spec: &CommandSpec) -> HalResult<String> {
        match self {
            FakeResponse::Output(stdout) => Ok(stdout.trim().to_string()),
            FakeResponse::Exit { code, stderr } => Err(HalError::CommandFailed {
                program: spec.program.clone(),
                code: Some(code),
                stderr,
            }),
            FakeResponse::NotFound => Err(HalError::CommandNotFound(spec.program.clone())),
            FakeResponse::Timeout => Err(HalError::CommandTimeout {
                program: spec.program.clone(),
                timeout_secs: spec.timeout.as_secs(),
            }),
        }
    }
}

/// Shared state for FakeHal operations.
#[derive(Debug, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// Scripted responses keyed by effective program name
    responses: HashMap<String, VecDeque<FakeResponse>>,
    /// Scripted identity; `None` means the default fake user
    user: Option<Result<UserIdentity, String>>,
    user_lookups: usize,
}

/// Fake HAL implementation that records operations without executing them.
///
/// Responses are matched by the *effective* program: for `sudo -n mount ...` the key is `mount`.
/// Queued responses are consumed in order and the last one repeats. Commands without a
/// scripted response succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeHalState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Queue a response for `program`.
    pub fn respond(&self, program: &str, response: FakeResponse) -> &Self {
        self.lock()
            .responses
            .entry(program.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn set_current_user(&self, user: UserIdentity) {
        self.lock().user = Some(Ok(user));
    }

    pub fn fail_current_user(&self, reason: impl Into<String>) {
        self.lock().user = Some(Err(reason.into()));
    }

    /// Number of identity lookups performed so far.
    pub fn user_lookups(&self) -> usize {
        self.lock().user_lookups
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.lock().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.lock().operations.iter().any(check)
    }

    /// Full argv (program first) of every recorded command.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Command { program, args, .. } => {
                    let mut argv = vec![program.clone()];
                    argv.extend(args.iter().cloned());
                    Some(argv)
                }
                Operation::CurrentUser => None,
            })
            .collect()
    }

    /// Clear recorded operations and scripted responses.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.operations.clear();
        state.responses.clear();
        state.user_lookups = 0;
    }

    fn record_operation(&self, op: Operation) {
        self.lock().operations.push(op);
    }

    fn next_response(&self, key: &str) -> Option<FakeResponse> {
        let mut state = self.lock();
        let queue = state.responses.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn effective_program(spec: &CommandSpec) -> &str {
    if !ESCALATION_PROGRAMS.contains(&spec.program.as_str()) {
        return &spec.program;
    }
    // Skip the escalation tool's own flags (`sudo -n`).
    spec.args
        .iter()
        .find(|arg| !arg.starts_with('-'))
        .map_or(spec.program.as_str(), String::as_str)
}

impl ProcessOps for FakeHal {
    fn command_output(&self, spec: &CommandSpec) -> HalResult<String> {
        log::info!("FAKE HAL: {}", spec);
        self.record_operation(Operation::Command {
            program: spec.program.clone(),
            args: spec.args.clone(),
            timeout_secs: spec.timeout.as_secs(),
        });

        match self.next_response(effective_program(spec)) {
            Some(response) => response.into_result(spec),
            None => Ok(String::new()),
        }
    }
}

impl IdentityOps for FakeHal {
    fn current_user(&self) -> HalResult<UserIdentity> {
        let scripted = {
            let mut state = self.lock();
            state.user_lookups += 1;
            state.operations.push(Operation::CurrentUser);
            state.user.clone()
        };
        match scripted {
            None => Ok(UserIdentity {
                name: "fake".to_string(),
                uid: 1000,
                gid: 1000,
            }),
            Some(Ok(user)) => Ok(user),
            Some(Err(reason)) => Err(HalError::Other(reason)),
        }
    }
}
