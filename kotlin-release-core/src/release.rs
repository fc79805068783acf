//! High-level pipeline: download dependencies → build → upload, three times over.
//!
//! This module holds the top-level orchestration of a release run. For a given
//! [`ReleaseConfig`] it:
//!   - Downloads the pinned JDKs and the `bunch` tool
//!   - Builds the compiler archive with gradle and uploads it
//!   - Builds the IntelliJ plugin and uploads it
//!   - Switches the sources to the Android Studio variant, builds and uploads
//!     that plugin, then restores the default variant
//!   - Resets the checkout after every sequence
//!
//! # Responsibilities
//! - Fail-fast: the first failing command ends the run and its error is returned
//! - The one exception is the variant restore, which is still attempted when
//!   the Android Studio sequence fails part way so the checkout is not left
//!   on the switched variant
//! - Every external effect goes through [`CommandRunner`] and
//!   [`WorkingDirectory`], so the sequence can be replayed against mocks
//!
//! # Navigation
//! - Main entrypoint: [`Release::run`]
//! - Supporting types: [`ReleaseReport`], [`UploadedArtifact`]

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::checkout::Checkout;
use crate::config::{compiler_zip_name, plugin_zip_name, ReleaseConfig, ReleasePaths};
use crate::contract::{CommandError, CommandRunner, CommandSpec, WorkingDirectory};
use crate::download::{download_deps, pinned_dependencies};
use crate::environment::java_env;
use crate::upload::{upload_file_to_cloud_storage, StorageLayout};

/// What a release run published, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub artifacts: Vec<UploadedArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedArtifact {
    pub name: String,
    pub local_path: PathBuf,
    pub destination: String,
    pub download_url: String,
}

/// Which optional parts of the run to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub download_deps: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            download_deps: true,
        }
    }
}

pub struct Release<'a, R: ?Sized, W: ?Sized> {
    config: &'a ReleaseConfig,
    paths: ReleasePaths,
    storage: StorageLayout,
    runner: &'a R,
    checkout: Checkout<'a, R, W>,
    base_path: Option<std::ffi::OsString>,
}

impl<'a, R, W> Release<'a, R, W>
where
    R: CommandRunner + ?Sized,
    W: WorkingDirectory + ?Sized,
{
    pub fn new(config: &'a ReleaseConfig, runner: &'a R, dirs: &'a W) -> Self {
        let paths = ReleasePaths::new(config);
        let checkout = Checkout::new(
            paths.root.clone(),
            config.tools.git.as_str(),
            paths.bunch.clone(),
            runner,
            dirs,
        );
        Self {
            config,
            storage: StorageLayout::new(config),
            paths,
            runner,
            checkout,
            base_path: std::env::var_os("PATH"),
        }
    }

    /// Uses `path` instead of the inherited `PATH` as the base the JDK is appended to.
    pub fn with_base_path(mut self, path: Option<std::ffi::OsString>) -> Self {
        self.base_path = path;
        self
    }

    pub fn paths(&self) -> &ReleasePaths {
        &self.paths
    }

    pub fn storage(&self) -> &StorageLayout {
        &self.storage
    }

    /// Runs the complete release: dependencies, compiler, IntelliJ plugin, Android Studio plugin.
    pub fn run(&self, options: ReleaseOptions) -> Result<ReleaseReport, CommandError> {
        info!(build_version = %self.config.build_version, "[RELEASE] Starting release");
        let mut report = ReleaseReport::default();

        if options.download_deps {
            self.download_deps()?;
        } else {
            info!("[RELEASE] Skipping dependency download");
        }
        report.artifacts.push(self.build_and_upload_compiler()?);
        report.artifacts.push(self.build_and_upload_kotlin_plugin()?);
        report
            .artifacts
            .push(self.build_and_upload_android_studio_plugin()?);

        info!(
            artifacts = report.artifacts.len(),
            "[RELEASE] Release complete"
        );
        Ok(report)
    }

    pub fn download_deps(&self) -> Result<(), CommandError> {
        let deps = pinned_dependencies(self.config, &self.paths);
        info!(count = deps.len(), bucket = %self.config.deps_bucket, "[RELEASE] Downloading dependencies");
        download_deps(self.runner, &self.config.tools.download, &deps)
    }

    pub fn build_and_upload_compiler(&self) -> Result<UploadedArtifact, CommandError> {
        let version = &self.config.build_version;
        info!(build_version = %version, "[RELEASE] Building compiler");

        self.gradle([
            "clean".to_string(),
            "cleanupArtifacts".to_string(),
            "-Pteamcity=true".to_string(),
            format!("-Pbuild.number={version}"),
        ])?;
        self.gradle([
            "-Pteamcity=true".to_string(),
            format!("-Pbuild.number={version}"),
            "zipCompiler".to_string(),
        ])?;

        let artifact = self.upload(&self.paths.compiler_zip, &compiler_zip_name(version))?;
        announce(&artifact);
        self.checkout.git_reset()?;
        Ok(artifact)
    }

    pub fn build_and_upload_kotlin_plugin(&self) -> Result<UploadedArtifact, CommandError> {
        info!("[RELEASE] Building IntelliJ plugin");
        self.build_plugin(&self.config.ij_plugin_suffix)?;
        let artifact = self.upload(
            &self.paths.plugin_zip,
            &plugin_zip_name(&self.config.build_version, "ij"),
        )?;
        announce(&artifact);
        self.checkout.git_reset()?;
        Ok(artifact)
    }

    /// Builds against the Android Studio variant. The variant is restored even
    /// when the build or upload fails; the original error is returned.
    pub fn build_and_upload_android_studio_plugin(&self) -> Result<UploadedArtifact, CommandError> {
        let variant = &self.config.studio_variant;
        info!(variant = %variant, "[RELEASE] Building Android Studio plugin");
        self.checkout.bunch_switch(variant)?;

        let built = self.build_plugin(&self.config.studio_plugin_suffix).and_then(|()| {
            self.upload(
                &self.paths.plugin_zip,
                &plugin_zip_name(&self.config.build_version, variant),
            )
        });

        let artifact = match built {
            Ok(artifact) => {
                self.checkout.bunch_restore()?;
                artifact
            }
            Err(e) => {
                error!(error = %e, variant = %variant, "[RELEASE][ERROR] Android Studio plugin failed, restoring variant");
                if let Err(restore) = self.checkout.bunch_restore() {
                    warn!(error = %restore, "[RELEASE] Variant restore failed; checkout may remain switched");
                }
                return Err(e);
            }
        };

        announce(&artifact);
        self.checkout.git_reset()?;
        Ok(artifact)
    }

    pub fn git_reset(&self) -> Result<(), CommandError> {
        self.checkout.git_reset()
    }

    pub fn bunch_switch(&self, target: &str) -> Result<(), CommandError> {
        self.checkout.bunch_switch(target)
    }

    pub fn bunch_restore(&self) -> Result<(), CommandError> {
        self.checkout.bunch_restore()
    }

    /// `ideaPlugin` then `zipPlugin`, both stamped with `<version>-<suffix>`.
    fn build_plugin(&self, suffix: &str) -> Result<(), CommandError> {
        let version = &self.config.build_version;
        let properties = [
            "-Pteamcity=true".to_string(),
            format!("-Pbuild.number={version}"),
            format!("-PdeployVersion={version}"),
            format!("-PpluginVersion={version}-{suffix}"),
        ];
        self.gradle(
            ["clean", "cleanupArtifacts", "ideaPlugin"]
                .into_iter()
                .map(String::from)
                .chain(properties.iter().cloned()),
        )?;
        self.gradle(
            ["writePluginVersion", "zipPlugin"]
                .into_iter()
                .map(String::from)
                .chain(properties.iter().cloned()),
        )
    }

    fn gradle<I>(&self, args: I) -> Result<(), CommandError>
    where
        I: IntoIterator<Item = String>,
    {
        let env = java_env(&self.paths, &self.config.gradle_opts, self.base_path.clone());
        let cmd = CommandSpec::new(self.config.tools.build.as_str())
            .args(args)
            .env(env);
        self.checkout.run_in_root(&cmd)
    }

    fn upload(&self, local: &Path, name: &str) -> Result<UploadedArtifact, CommandError> {
        let destination = self.storage.destination(name);
        upload_file_to_cloud_storage(
            self.runner,
            &self.config.tools.upload,
            local,
            &destination,
            self.config.public_read,
        )?;
        Ok(UploadedArtifact {
            name: name.to_string(),
            local_path: local.to_path_buf(),
            download_url: self.storage.download_url(name),
            destination,
        })
    }
}

fn announce(artifact: &UploadedArtifact) {
    println!("Uploaded to: {}", artifact.download_url);
    info!(artifact = %artifact.name, url = %artifact.download_url, "[RELEASE] Uploaded");
}
