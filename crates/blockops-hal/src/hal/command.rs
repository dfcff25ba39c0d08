//! Structured command construction.
//!
//! Commands are kept as argv lists end to end. Nothing is ever handed to a
//! shell, so device names or paths containing shell metacharacters are passed
//! through as literal arguments.

use std::fmt;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the command through a privilege escalation prefix (e.g. `sudo` or
    /// `sudo -n`).
    ///
    /// The prefix is split on whitespace: the first word becomes the program
    /// and the rest come before the original argv. `None` or a blank prefix
    /// leaves the command as is.
    pub fn privileged(self, escalation: Option<&str>) -> Self {
        let mut words = escalation.unwrap_or_default().split_whitespace();
        let Some(prefix) = words.next() else {
            return self;
        };
        let mut args: Vec<String> = words.map(str::to_string).collect();
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: prefix.to_string(),
            args,
            timeout: self.timeout,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
