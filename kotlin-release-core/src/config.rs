//! Release settings and the filesystem layout derived from them.
//!
//! [`ReleaseConfig`] is built once (defaults, then a config file, then the
//! environment) and validated before the first command runs. [`ReleasePaths`]
//! turns it into the absolute locations of the JDKs, the `bunch` tool and the
//! build outputs. Those paths are handed to commands that run inside the
//! checkout, so they must not depend on the working directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_BUILD_VERSION: &str = "1.4.31-google-ir-02";
pub const DEFAULT_ARCHIVE_PREFIX: &str = "r8-releases/kotlin-releases";
pub const DEFAULT_STORAGE_URL_PREFIX: &str = "http://storage.googleapis.com";
pub const DEFAULT_DEPS_BUCKET: &str = "r8-deps";

/// Names of the external programs a release run shells out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub download: String,
    pub upload: String,
    pub build: String,
    pub git: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            download: "download_from_google_storage".to_string(),
            upload: "gsutil.py".to_string(),
            build: "./gradlew".to_string(),
            git: "git".to_string(),
        }
    }
}

/// Everything a release run needs to know, fixed before the first command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    pub build_version: String,
    pub archive_prefix: String,
    pub storage_url_prefix: String,
    /// The checkout the build tool runs in.
    pub root: PathBuf,
    /// Where pinned dependencies (JDKs, bunch) are downloaded to.
    pub third_party: PathBuf,
    pub deps_bucket: String,
    pub authenticated_download: bool,
    pub public_read: bool,
    pub gradle_opts: String,
    /// Compatibility variant used for the Android Studio plugin.
    pub studio_variant: String,
    pub ij_plugin_suffix: String,
    pub studio_plugin_suffix: String,
    pub tools: ToolConfig,
}

impl ReleaseConfig {
    /// Defaults for a release tool living in `scripts_dir`, one level below the checkout root.
    pub fn for_scripts_dir(scripts_dir: &Path) -> Self {
        let root = scripts_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| scripts_dir.join(".."));
        Self {
            build_version: DEFAULT_BUILD_VERSION.to_string(),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            storage_url_prefix: DEFAULT_STORAGE_URL_PREFIX.to_string(),
            root,
            third_party: scripts_dir.join("third_party"),
            deps_bucket: DEFAULT_DEPS_BUCKET.to_string(),
            authenticated_download: false,
            public_read: true,
            gradle_opts: "-Xmx1g".to_string(),
            studio_variant: "as42".to_string(),
            ij_plugin_suffix: "release-IJ".to_string(),
            studio_plugin_suffix: "release-Studio4.2-1".to_string(),
            tools: ToolConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let version = &self.build_version;
        if version.is_empty() {
            return Err(ConfigError::EmptyBuildVersion);
        }
        if version.contains('/') || version.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidBuildVersion(version.clone()));
        }
        for (field, path) in [("root", &self.root), ("third_party", &self.third_party)] {
            if !path.is_absolute() {
                return Err(ConfigError::RelativePath {
                    field,
                    path: path.clone(),
                });
            }
        }
        for (field, value) in [
            ("archive_prefix", &self.archive_prefix),
            ("storage_url_prefix", &self.storage_url_prefix),
            ("deps_bucket", &self.deps_bucket),
            ("studio_variant", &self.studio_variant),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(field));
            }
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            build_version = %self.build_version,
            root = %self.root.display(),
            third_party = %self.third_party.display(),
            "Loaded ReleaseConfig"
        );
        debug!(?self, "ReleaseConfig loaded (full debug)");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("build version must not be empty")]
    EmptyBuildVersion,
    #[error("build version {0:?} must not contain '/' or whitespace")]
    InvalidBuildVersion(String),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{field} must be an absolute path, got {}", .path.display())]
    RelativePath { field: &'static str, path: PathBuf },
}

/// Filesystem locations derived once from a [`ReleaseConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePaths {
    pub root: PathBuf,
    pub third_party: PathBuf,
    pub jdk7: PathBuf,
    pub jdk8: PathBuf,
    pub jdk9: PathBuf,
    pub bunch: PathBuf,
    pub compiler_zip: PathBuf,
    /// Output of `zipPlugin`, shared by both IDE plugin builds.
    pub plugin_zip: PathBuf,
}

impl ReleasePaths {
    pub fn new(config: &ReleaseConfig) -> Self {
        let root = config.root.clone();
        let third_party = config.third_party.clone();
        Self {
            jdk7: third_party.join("jdk7").join("java-se-7u75-ri"),
            jdk8: third_party.join("jdk8").join("linux-x86"),
            jdk9: third_party.join("jdk9").join("linux"),
            bunch: third_party.join("bunch-cli-1.1.0").join("bin").join("bunch"),
            compiler_zip: root.join("dist").join(compiler_zip_name(&config.build_version)),
            plugin_zip: root.join("build").join("kotlin-plugin.zip"),
            root,
            third_party,
        }
    }

    /// Checksum manifests of the pinned dependencies, in download order.
    pub fn dependency_manifests(&self) -> Vec<PathBuf> {
        vec![
            self.third_party.join("jdk7").join("java-se-7u75-ri.tar.gz.sha1"),
            self.third_party.join("jdk8").join("linux-x86.tar.gz.sha1"),
            self.third_party.join("jdk9").join("linux.tar.gz.sha1"),
            self.third_party.join("bunch-cli-1.1.0.tar.gz.sha1"),
        ]
    }
}

pub fn compiler_zip_name(version: &str) -> String {
    format!("kotlin-compiler-{version}.zip")
}

pub fn plugin_zip_name(version: &str, ide: &str) -> String {
    format!("kotlin-plugin-{version}-{ide}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReleaseConfig {
        ReleaseConfig::for_scripts_dir(Path::new("/src/kotlin/google-scripts"))
    }

    #[test]
    fn defaults_anchor_on_scripts_dir() {
        let config = config();
        assert_eq!(config.root, PathBuf::from("/src/kotlin"));
        assert_eq!(
            config.third_party,
            PathBuf::from("/src/kotlin/google-scripts/third_party")
        );
        assert_eq!(config.build_version, DEFAULT_BUILD_VERSION);
        assert!(config.public_read);
        assert!(!config.authenticated_download);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_paths_match_layout() {
        let paths = ReleasePaths::new(&config());
        let tp = Path::new("/src/kotlin/google-scripts/third_party");
        assert_eq!(paths.jdk7, tp.join("jdk7/java-se-7u75-ri"));
        assert_eq!(paths.jdk8, tp.join("jdk8/linux-x86"));
        assert_eq!(paths.jdk9, tp.join("jdk9/linux"));
        assert_eq!(paths.bunch, tp.join("bunch-cli-1.1.0/bin/bunch"));
        assert_eq!(
            paths.compiler_zip,
            PathBuf::from("/src/kotlin/dist/kotlin-compiler-1.4.31-google-ir-02.zip")
        );
        assert_eq!(
            paths.plugin_zip,
            PathBuf::from("/src/kotlin/build/kotlin-plugin.zip")
        );
        assert_eq!(paths.dependency_manifests().len(), 4);
        assert_eq!(
            paths.dependency_manifests()[3],
            tp.join("bunch-cli-1.1.0.tar.gz.sha1")
        );
    }

    #[test]
    fn rejects_versions_that_break_paths() {
        let mut config = config();
        config.build_version = String::new();
        assert_eq!(config.validate(), Err(ConfigError::EmptyBuildVersion));

        config.build_version = "1.4/31".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBuildVersion(_))
        ));

        config.build_version = "1.4.31 rc".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_blank_bucket() {
        let mut config = config();
        config.deps_bucket = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyField("deps_bucket")));
    }

    #[test]
    fn rejects_relative_locations() {
        let mut config = config();
        config.third_party = PathBuf::from("deps");
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::RelativePath {
                field: "third_party",
                path: PathBuf::from("deps"),
            }
        );
        assert_eq!(err.to_string(), "third_party must be an absolute path, got deps");

        let mut config = self::config();
        config.root = PathBuf::from("checkout");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RelativePath { field: "root", .. })
        ));
    }

    #[test]
    fn artifact_names() {
        assert_eq!(compiler_zip_name("1.0"), "kotlin-compiler-1.0.zip");
        assert_eq!(plugin_zip_name("1.0", "ij"), "kotlin-plugin-1.0-ij.zip");
        assert_eq!(plugin_zip_name("1.0", "as42"), "kotlin-plugin-1.0-as42.zip");
    }
}
