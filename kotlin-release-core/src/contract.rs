//! # contract: the seams between orchestration and the outside world
//!
//! Every side effect of a release run goes through one of two traits:
//! - [`CommandRunner`] runs a single external program to completion.
//! - [`WorkingDirectory`] reads and changes the process working directory.
//!
//! The orchestration code in [`crate::release`] is generic over both, so the
//! whole sequence can be driven by the process-backed implementations in
//! [`crate::process`], by a dry run, or by `mockall` mocks in tests.
//!
//! ## Mocking & Testing
//! Both traits are annotated with `automock`. The generated `MockCommandRunner`
//! and `MockWorkingDirectory` are exported under the default
//! `test-export-mocks` feature so integration tests in other crates can use them.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// A single external command: program, ordered arguments and optional
/// environment overrides layered on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Variables to set for this command only. `None` means inherit as-is.
    pub env: Option<BTreeMap<String, String>>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: None,
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

    pub fn env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// `program arg1 arg2 ...` without the environment prefix.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Renders as `KEY="value" ... program args`, the form printed before a command runs.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(env) = &self.env {
            for (key, value) in env {
                write!(f, "{key}=\"{value}\" ")?;
            }
        }
        f.write_str(&self.command_line())
    }
}

/// The only failure a release run knows about: an external step did not succeed.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all (missing binary, permissions).
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The program ran and exited unsuccessfully. `code` is `None` when it was
    /// terminated by a signal.
    #[error("`{program}` {}", describe_exit(.code))]
    Failed { program: String, code: Option<i32> },
    /// Entering or leaving a working directory failed.
    #[error("failed to change directory to {}: {source}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl CommandError {
    /// Exit code to hand back to the caller of the release tool.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Runs one external command to completion, blocking the caller.
///
/// Implementations inherit stdio so the tool's own diagnostics reach the user,
/// and must map any non-zero exit to [`CommandError::Failed`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait CommandRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), CommandError>;
}

/// Access to the process-wide working directory.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait WorkingDirectory {
    fn current_dir(&self) -> io::Result<PathBuf>;

    fn set_current_dir(&self, path: &Path) -> io::Result<()>;
}
