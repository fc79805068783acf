//! # upload: publishing artifacts to the release bucket
//!
//! Artifacts land under `gs://<archive prefix>/<build version>/<name>` and are
//! readable over plain HTTP at `<storage host>/<archive prefix>/<build version>/<name>`.
//! The copy itself is delegated to the upload CLI; nothing here talks to the
//! storage API directly.

use std::path::Path;

use tracing::{error, info};

use crate::config::ReleaseConfig;
use crate::contract::{CommandError, CommandRunner, CommandSpec};

/// Where a given build version's artifacts live in the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub archive_prefix: String,
    pub storage_url_prefix: String,
    pub build_version: String,
}

impl StorageLayout {
    pub fn new(config: &ReleaseConfig) -> Self {
        Self {
            archive_prefix: config.archive_prefix.clone(),
            storage_url_prefix: config.storage_url_prefix.clone(),
            build_version: config.build_version.clone(),
        }
    }

    /// `gs://` URL the artifact `name` is copied to.
    pub fn destination(&self, name: &str) -> String {
        format!("gs://{}/{}/{}", self.archive_prefix, self.build_version, name)
    }

    /// Public HTTP URL of the uploaded artifact `name`.
    pub fn download_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.storage_url_prefix.trim_end_matches('/'),
            self.archive_prefix,
            self.build_version,
            name
        )
    }
}

/// `<tool> cp [-a public-read] <source> <destination>`
pub fn upload_command(tool: &str, source: &Path, destination: &str, public_read: bool) -> CommandSpec {
    let mut cmd = CommandSpec::new(tool).arg("cp");
    if public_read {
        cmd = cmd.args(["-a", "public-read"]);
    }
    cmd.arg(source.display().to_string()).arg(destination)
}

pub fn upload_file_to_cloud_storage<R>(
    runner: &R,
    tool: &str,
    source: &Path,
    destination: &str,
    public_read: bool,
) -> Result<(), CommandError>
where
    R: CommandRunner + ?Sized,
{
    let cmd = upload_command(tool, source, destination, public_read);
    runner.run(&cmd).map_err(|e| {
        error!(
            error = %e,
            source = %source.display(),
            destination = %destination,
            "Upload failed"
        );
        e
    })?;
    info!(source = %source.display(), destination = %destination, "Uploaded artifact");
    Ok(())
}
