//! Environment for build-tool invocations.
//!
//! Only the overrides are computed here; the runner layers them on top of the
//! inherited environment.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use crate::config::ReleasePaths;

/// JDK homes, `GRADLE_OPTS` and a `PATH` ending in the JDK 8 `bin` directory.
///
/// `base_path` is the caller's `PATH`, if any; the JDK directory is appended
/// after it.
pub fn java_env(
    paths: &ReleasePaths,
    gradle_opts: &str,
    base_path: Option<OsString>,
) -> BTreeMap<String, String> {
    let jdk8_bin = paths.jdk8.join("bin");
    let path = match base_path.filter(|p| !p.is_empty()) {
        Some(base) => {
            let mut entries: Vec<_> = std::env::split_paths(&base).collect();
            entries.push(jdk8_bin.clone());
            match std::env::join_paths(entries) {
                Ok(joined) => joined.to_string_lossy().into_owned(),
                // An entry containing the separator cannot be re-joined; keep the raw base.
                Err(_) => format!(
                    "{}{}{}",
                    base.to_string_lossy(),
                    path_separator(),
                    jdk8_bin.display()
                ),
            }
        }
        None => jdk8_bin.display().to_string(),
    };

    let mut env = BTreeMap::new();
    env.insert("JAVA_HOME".to_string(), display(&paths.jdk8));
    env.insert("PATH".to_string(), path);
    env.insert("GRADLE_OPTS".to_string(), gradle_opts.to_string());
    env.insert("JDK_16".to_string(), display(&paths.jdk7));
    env.insert("JDK_17".to_string(), display(&paths.jdk7));
    env.insert("JDK_18".to_string(), display(&paths.jdk8));
    env.insert("JDK_9".to_string(), display(&paths.jdk9));
    env
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ReleaseConfig;

    fn paths() -> ReleasePaths {
        ReleasePaths::new(&ReleaseConfig::for_scripts_dir(Path::new("/k/scripts")))
    }

    #[test]
    fn pins_every_jdk_generation() {
        let env = java_env(&paths(), "-Xmx1g", None);
        let tp = "/k/scripts/third_party";
        assert_eq!(env["JAVA_HOME"], format!("{tp}/jdk8/linux-x86"));
        assert_eq!(env["JDK_16"], format!("{tp}/jdk7/java-se-7u75-ri"));
        assert_eq!(env["JDK_17"], format!("{tp}/jdk7/java-se-7u75-ri"));
        assert_eq!(env["JDK_18"], format!("{tp}/jdk8/linux-x86"));
        assert_eq!(env["JDK_9"], format!("{tp}/jdk9/linux"));
        assert_eq!(env["GRADLE_OPTS"], "-Xmx1g");
        assert_eq!(env.len(), 7);
    }

    #[test]
    fn appends_jdk_bin_to_existing_path() {
        let env = java_env(&paths(), "-Xmx1g", Some(OsString::from("/usr/bin:/bin")));
        assert_eq!(
            env["PATH"],
            "/usr/bin:/bin:/k/scripts/third_party/jdk8/linux-x86/bin"
        );
    }

    #[test]
    fn missing_path_is_just_the_jdk() {
        let env = java_env(&paths(), "-Xmx2g", Some(OsString::new()));
        assert_eq!(env["PATH"], "/k/scripts/third_party/jdk8/linux-x86/bin");
        assert_eq!(env["GRADLE_OPTS"], "-Xmx2g");
    }
}
