//! Scoped working-directory changes.
//!
//! [`ChangedWorkingDirectory`] records the current directory, enters a target
//! directory and puts the previous one back when dropped. Because restoration
//! lives in `Drop`, it happens on normal return, on `?` propagation and while
//! unwinding from a panic.
//!
//! The working directory is process-wide state. The release run is strictly
//! sequential, so only one guard is ever alive at a time.

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::contract::{CommandError, WorkingDirectory};

/// Guard that restores the previous working directory on drop.
#[must_use = "the previous directory is restored as soon as the guard is dropped"]
pub struct ChangedWorkingDirectory<'a, W: WorkingDirectory + ?Sized> {
    dirs: &'a W,
    previous: PathBuf,
    quiet: bool,
}

impl<'a, W: WorkingDirectory + ?Sized> ChangedWorkingDirectory<'a, W> {
    pub fn enter(dirs: &'a W, target: &Path) -> Result<Self, CommandError> {
        Self::enter_with(dirs, target, false)
    }

    /// Like [`enter`](Self::enter), without the debug events.
    pub fn enter_quiet(dirs: &'a W, target: &Path) -> Result<Self, CommandError> {
        Self::enter_with(dirs, target, true)
    }

    fn enter_with(dirs: &'a W, target: &Path, quiet: bool) -> Result<Self, CommandError> {
        let previous = dirs
            .current_dir()
            .map_err(|source| CommandError::WorkingDirectory {
                path: PathBuf::from("."),
                source,
            })?;
        if !quiet {
            debug!(dir = %target.display(), "Enter directory");
        }
        dirs.set_current_dir(target)
            .map_err(|source| CommandError::WorkingDirectory {
                path: target.to_path_buf(),
                source,
            })?;
        Ok(Self {
            dirs,
            previous,
            quiet,
        })
    }

    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl<W: WorkingDirectory + ?Sized> Drop for ChangedWorkingDirectory<'_, W> {
    fn drop(&mut self) {
        if !self.quiet {
            debug!(dir = %self.previous.display(), "Restore directory");
        }
        if let Err(e) = self.dirs.set_current_dir(&self.previous) {
            error!(
                error = ?e,
                dir = %self.previous.display(),
                "Failed to restore previous working directory"
            );
        }
    }
}

/// Runs `action` with `dir` as the working directory, restoring the previous
/// directory afterwards whatever the outcome.
pub fn in_directory<W, T, E, F>(dirs: &W, dir: &Path, action: F) -> Result<T, E>
where
    W: WorkingDirectory + ?Sized,
    E: From<CommandError>,
    F: FnOnce() -> Result<T, E>,
{
    let _guard = ChangedWorkingDirectory::enter(dirs, dir)?;
    action()
}
