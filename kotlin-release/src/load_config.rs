/// `load_config` module: turns an optional YAML file plus environment overrides into a [`ReleaseConfig`].
///
/// Every key in the file is optional; anything left out keeps the built-in
/// default. This is the only place YAML is parsed.
///
/// # Responsibilities
/// - Start from defaults anchored on this crate's directory (the tool lives one
///   level below the checkout root, with `third_party/` next to it)
/// - Overlay the YAML file, resolving relative `root`/`third_party` against the
///   file's own directory
/// - Apply `KOTLIN_RELEASE_BUILD_VERSION` from the environment last
/// - Validate before anything is run
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use kotlin_release_core::config::{ReleaseConfig, ToolConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Overrides the build version from any config file.
pub const BUILD_VERSION_ENV: &str = "KOTLIN_RELEASE_BUILD_VERSION";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub build_version: Option<String>,
    pub archive_prefix: Option<String>,
    pub storage_url_prefix: Option<String>,
    pub root: Option<PathBuf>,
    pub third_party: Option<PathBuf>,
    pub deps_bucket: Option<String>,
    pub authenticated_download: Option<bool>,
    pub public_read: Option<bool>,
    pub gradle_opts: Option<String>,
    pub studio_variant: Option<String>,
    pub ij_plugin_suffix: Option<String>,
    pub studio_plugin_suffix: Option<String>,
    pub tools: Option<ToolsSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    pub download: Option<String>,
    pub upload: Option<String>,
    pub build: Option<String>,
    pub git: Option<String>,
}

/// Directory the tool's defaults are anchored on.
///
/// This is the crate's source directory as recorded at compile time, so the
/// defaults only point at a real checkout when the binary runs from the tree
/// it was built in. An installed or copied binary should be given `--config`
/// with explicit `root` and `third_party`.
pub fn default_scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Defaults, optionally overlaid with `path`, then the environment.
pub fn resolve_config(path: Option<&Path>) -> Result<ReleaseConfig> {
    let mut config = ReleaseConfig::for_scripts_dir(&default_scripts_dir());
    if let Some(path) = path {
        let file = read_config_file(path)?;
        let base_dir = config_base_dir(path)?;
        apply_file(&mut config, file, &base_dir);
    } else {
        info!("No config file given, using built-in defaults");
    }
    apply_env(&mut config);
    config
        .validate()
        .map_err(|e| {
            error!(error = %e, "Invalid release configuration");
            e
        })
        .context("Invalid release configuration")?;
    Ok(config)
}

/// Loads `path` over the defaults; see [`resolve_config`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ReleaseConfig> {
    resolve_config(Some(path.as_ref()))
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(file) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(file)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Absolute directory holding `path`; relative locations in the file are joined onto it.
fn config_base_dir(path: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd,
    })
}

fn apply_file(config: &mut ReleaseConfig, file: ConfigFile, base_dir: &Path) {
    fn set<T>(slot: &mut T, value: Option<T>) {
        if let Some(value) = value {
            *slot = value;
        }
    }

    set(&mut config.build_version, file.build_version);
    set(&mut config.archive_prefix, file.archive_prefix);
    set(&mut config.storage_url_prefix, file.storage_url_prefix);
    set(&mut config.root, file.root.map(|p| base_dir.join(p)));
    set(&mut config.third_party, file.third_party.map(|p| base_dir.join(p)));
    set(&mut config.deps_bucket, file.deps_bucket);
    set(&mut config.authenticated_download, file.authenticated_download);
    set(&mut config.public_read, file.public_read);
    set(&mut config.gradle_opts, file.gradle_opts);
    set(&mut config.studio_variant, file.studio_variant);
    set(&mut config.ij_plugin_suffix, file.ij_plugin_suffix);
    set(&mut config.studio_plugin_suffix, file.studio_plugin_suffix);

    if let Some(tools) = file.tools {
        let ToolConfig {
            download,
            upload,
            build,
            git,
        } = &mut config.tools;
        set(download, tools.download);
        set(upload, tools.upload);
        set(build, tools.build);
        set(git, tools.git);
    }
}

fn apply_env(config: &mut ReleaseConfig) {
    if let Ok(version) = std::env::var(BUILD_VERSION_ENV) {
        info!(build_version = %version, "{BUILD_VERSION_ENV} found in env");
        config.build_version = version;
    }
}
