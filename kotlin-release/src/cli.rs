//! CLI glue for the release tool: argument parsing, config resolution and
//! picking real or dry-run collaborators. All release logic lives in
//! `kotlin-release-core`.
//!
//! Running the binary with no arguments performs the full release.
use crate::load_config::resolve_config;
use anyhow::Result;
use clap::Parser;
use kotlin_release_core::contract::CommandError;
use kotlin_release_core::process::{DryRun, ProcessCommandRunner, ProcessWorkingDirectory};
use kotlin_release_core::release::{Release, ReleaseOptions, ReleaseReport};
use std::path::PathBuf;

/// Builds the Kotlin compiler and IDE plugins and uploads them to the release bucket.
#[derive(Debug, Parser)]
#[clap(
    name = "kotlin-release",
    version,
    about = "Build the Kotlin compiler and IDE plugins and publish them to the release bucket"
)]
pub struct Cli {
    /// YAML file overriding the built-in release settings
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Print every command instead of running it
    #[clap(long)]
    pub dry_run: bool,

    /// Assume third_party/ is already populated
    #[clap(long)]
    pub skip_deps: bool,
}

/// Extracted CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<ReleaseReport> {
    tracing::info!("trace_initialised");

    let config = resolve_config(cli.config.as_deref())?;
    config.trace_loaded();
    let options = ReleaseOptions {
        download_deps: !cli.skip_deps,
    };

    let result = if cli.dry_run {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let dry = DryRun::new(start);
        let release = Release::new(&config, &dry, &dry);
        release.run(options)
    } else {
        let runner = ProcessCommandRunner::new();
        let release = Release::new(&config, &runner, &ProcessWorkingDirectory);
        release.run(options)
    };

    match result {
        Ok(report) => {
            tracing::info!(command = "release", ?report, "Release complete");
            println!("Release {} complete:", config.build_version);
            for artifact in &report.artifacts {
                println!("  {} -> {}", artifact.name, artifact.download_url);
            }
            Ok(report)
        }
        Err(e) => {
            tracing::error!(command = "release", error = %e, "Release failed");
            Err(anyhow::Error::new(e).context(format!(
                "Release {} failed",
                config.build_version
            )))
        }
    }
}

/// Process exit code for a failed run: the failing command's own status when
/// it fits in 1..=255, otherwise 1.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<CommandError>()
        .map(CommandError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}
