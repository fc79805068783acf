//! Concrete implementations of the [`contract`](crate::contract) traits.
//!
//! - [`ProcessCommandRunner`] spawns real programs with inherited stdio.
//! - [`ProcessWorkingDirectory`] changes the real process working directory.
//! - [`DryRun`] implements both and only reports what would happen.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info};

use crate::contract::{CommandError, CommandRunner, CommandSpec, WorkingDirectory};

/// Runs commands as child processes of this one and waits for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandRunner {
    quiet: bool,
}

impl ProcessCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the `Running: ...` line printed before every command.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), CommandError> {
        if !self.quiet {
            println!("Running: {command}");
        }
        info!(program = %command.program, command = %command.command_line(), "Running command");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(env) = &command.env {
            cmd.envs(env);
        }

        let status = cmd.status().map_err(|source| {
            error!(error = ?source, program = %command.program, "Failed to launch command");
            CommandError::Launch {
                program: command.program.clone(),
                source,
            }
        })?;

        if status.success() {
            info!(program = %command.program, status = ?status, "Command succeeded");
            Ok(())
        } else {
            error!(
                program = %command.program,
                command = %command.command_line(),
                "Command exited with non-zero code: {}", status
            );
            Err(CommandError::Failed {
                program: command.program.clone(),
                code: status.code(),
            })
        }
    }
}

/// The real process working directory, via `std::env`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessWorkingDirectory;

impl WorkingDirectory for ProcessWorkingDirectory {
    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn set_current_dir(&self, path: &Path) -> io::Result<()> {
        std::env::set_current_dir(path)
    }
}

/// Reports commands instead of running them and tracks a virtual working
/// directory, so a full release can be previewed from anywhere.
#[derive(Debug)]
pub struct DryRun {
    cwd: RefCell<PathBuf>,
}

impl DryRun {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            cwd: RefCell::new(start.into()),
        }
    }
}

impl CommandRunner for DryRun {
    fn run(&self, command: &CommandSpec) -> Result<(), CommandError> {
        let cwd = self.cwd.borrow();
        println!("Would run (in {}): {command}", cwd.display());
        info!(
            program = %command.program,
            command = %command.command_line(),
            dir = %cwd.display(),
            "Dry run: skipping command"
        );
        Ok(())
    }
}

impl WorkingDirectory for DryRun {
    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.cwd.borrow().clone())
    }

    fn set_current_dir(&self, path: &Path) -> io::Result<()> {
        let mut cwd = self.cwd.borrow_mut();
        let next = cwd.join(path);
        *cwd = next;
        Ok(())
    }
}
