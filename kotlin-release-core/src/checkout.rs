//! Operations on the checkout the release is built from.
//!
//! Every command here runs with the checkout root as working directory. The
//! build tool edits tracked files, so the tree is hard-reset between builds.
//! The `bunch` tool switches the sources to another IDE compatibility
//! variant and back; nothing verifies that a switch took effect.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::contract::{CommandError, CommandRunner, CommandSpec, WorkingDirectory};
use crate::workdir::in_directory;

pub struct Checkout<'a, R: ?Sized, W: ?Sized> {
    root: PathBuf,
    git: String,
    bunch: PathBuf,
    runner: &'a R,
    dirs: &'a W,
}

impl<'a, R, W> Checkout<'a, R, W>
where
    R: CommandRunner + ?Sized,
    W: WorkingDirectory + ?Sized,
{
    pub fn new(
        root: impl Into<PathBuf>,
        git: impl Into<String>,
        bunch: impl Into<PathBuf>,
        runner: &'a R,
        dirs: &'a W,
    ) -> Self {
        Self {
            root: root.into(),
            git: git.into(),
            bunch: bunch.into(),
            runner,
            dirs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs `command` inside the checkout root.
    pub fn run_in_root(&self, command: &CommandSpec) -> Result<(), CommandError> {
        in_directory(self.dirs, &self.root, || self.runner.run(command))
    }

    /// Discards every change to tracked files.
    pub fn git_reset(&self) -> Result<(), CommandError> {
        let cmd = CommandSpec::new(self.git.as_str()).args(["reset", "--hard"]);
        self.run_in_root(&cmd)?;
        info!(root = %self.root.display(), "Checkout reset");
        Ok(())
    }

    /// Resets the tree, then switches the sources to `target`.
    pub fn bunch_switch(&self, target: &str) -> Result<(), CommandError> {
        self.git_reset()?;
        let cmd = CommandSpec::new(self.bunch.display().to_string()).args(["switch", target]);
        self.run_in_root(&cmd)?;
        info!(variant = %target, "Switched source variant");
        Ok(())
    }

    /// Resets the tree, then returns the sources to the default variant.
    pub fn bunch_restore(&self) -> Result<(), CommandError> {
        self.git_reset()?;
        let cmd = CommandSpec::new(self.bunch.display().to_string()).arg("restore");
        self.run_in_root(&cmd)?;
        info!("Restored default source variant");
        Ok(())
    }
}
