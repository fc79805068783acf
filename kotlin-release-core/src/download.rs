//! Fetching pinned toolchain dependencies.
//!
//! Each dependency is described by a `.sha1` manifest next to where its
//! archive should land. The download tool resolves the manifest against a
//! content-addressed bucket, fetches the archive and unpacks it in place.

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::{ReleaseConfig, ReleasePaths};
use crate::contract::{CommandError, CommandRunner, CommandSpec};

/// One pinned dependency: its checksum manifest and where to fetch it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
    pub manifest: PathBuf,
    pub bucket: String,
    /// When false the tool is told not to look for credentials (`-n`).
    pub authenticated: bool,
}

impl DependencyDescriptor {
    pub fn new(manifest: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            manifest: manifest.into(),
            bucket: bucket.into(),
            authenticated: false,
        }
    }
}

/// The JDKs and the bunch tool, in download order.
pub fn pinned_dependencies(config: &ReleaseConfig, paths: &ReleasePaths) -> Vec<DependencyDescriptor> {
    paths
        .dependency_manifests()
        .into_iter()
        .map(|manifest| DependencyDescriptor {
            manifest,
            bucket: config.deps_bucket.clone(),
            authenticated: config.authenticated_download,
        })
        .collect()
}

/// `<tool> [-n] -b <bucket> -u -s <manifest>`
pub fn download_command(tool: &str, dependency: &DependencyDescriptor) -> CommandSpec {
    let mut cmd = CommandSpec::new(tool);
    if !dependency.authenticated {
        cmd = cmd.arg("-n");
    }
    cmd.args(["-b", dependency.bucket.as_str(), "-u", "-s"])
        .arg(dependency.manifest.display().to_string())
}

pub fn download_from_storage<R>(
    runner: &R,
    tool: &str,
    dependency: &DependencyDescriptor,
) -> Result<(), CommandError>
where
    R: CommandRunner + ?Sized,
{
    let cmd = download_command(tool, dependency);
    match runner.run(&cmd) {
        Ok(()) => {
            info!(
                manifest = %dependency.manifest.display(),
                bucket = %dependency.bucket,
                "Downloaded dependency"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                error = %e,
                manifest = %dependency.manifest.display(),
                bucket = %dependency.bucket,
                "Dependency download failed"
            );
            Err(e)
        }
    }
}

/// Downloads every dependency in order, stopping at the first failure.
pub fn download_deps<R>(
    runner: &R,
    tool: &str,
    dependencies: &[DependencyDescriptor],
) -> Result<(), CommandError>
where
    R: CommandRunner + ?Sized,
{
    for dependency in dependencies {
        download_from_storage(runner, tool, dependency)?;
    }
    info!(count = dependencies.len(), "All dependencies downloaded");
    Ok(())
}
