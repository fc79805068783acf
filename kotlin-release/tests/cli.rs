use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

/// Creates a config file for the CLI to read.
fn create_config(yaml: &str) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(config.path(), yaml).expect("Writing temp config failed");
    config
}

fn release_cmd() -> Command {
    let mut cmd = Command::cargo_bin("kotlin-release").expect("Binary exists");
    cmd.env_remove("KOTLIN_RELEASE_BUILD_VERSION");
    cmd
}

#[test]
fn help_lists_options() {
    release_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--dry-run")
                .and(predicate::str::contains("--config"))
                .and(predicate::str::contains("--skip-deps")),
        );
}

#[test]
#[serial]
fn dry_run_prints_the_whole_sequence_without_running_it() {
    release_cmd()
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Would run")
                .and(predicate::str::contains("download_from_google_storage -n -b r8-deps"))
                .and(predicate::str::contains("zipCompiler"))
                .and(predicate::str::contains("bunch switch as42"))
                .and(predicate::str::contains("bunch restore"))
                .and(predicate::str::contains("git reset --hard"))
                .and(predicate::str::contains(
                    "gs://r8-releases/kotlin-releases/1.4.31-google-ir-02/kotlin-compiler-1.4.31-google-ir-02.zip",
                ))
                .and(predicate::str::contains(
                    "http://storage.googleapis.com/r8-releases/kotlin-releases/1.4.31-google-ir-02/kotlin-plugin-1.4.31-google-ir-02-as42.zip",
                )),
        );
}

#[test]
#[serial]
fn dry_run_honours_config_file_and_skip_deps() {
    let config = create_config(
        "build_version: 9.9.9-test\nroot: /tmp/kotlin-checkout\nstudio_variant: as43\n",
    );

    release_cmd()
        .arg("--dry-run")
        .arg("--skip-deps")
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("download_from_google_storage")
                .not()
                .and(predicate::str::contains("-Pbuild.number=9.9.9-test"))
                .and(predicate::str::contains("(in /tmp/kotlin-checkout)"))
                .and(predicate::str::contains("kotlin-plugin-9.9.9-test-as43.zip"))
                .and(predicate::str::contains("Release 9.9.9-test complete")),
        );
}

#[test]
fn missing_config_file_fails_before_running_anything() {
    release_cmd()
        .arg("--config")
        .arg("/definitely/not/here.yaml")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Running:").not())
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn invalid_build_version_is_rejected() {
    let config = create_config("build_version: \"1.4/31\"\n");
    release_cmd()
        .arg("--dry-run")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid release configuration"));
}

#[cfg(unix)]
#[test]
#[serial]
fn failing_command_exit_code_is_propagated() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let tool = dir.path().join("fetch-deps");
    write(&tool, "#!/bin/sh\nexit 7\n").unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = create_config(&format!(
        "root: {root}\nthird_party: {root}/third_party\ntools:\n  download: {tool}\n",
        root = dir.path().display(),
        tool = tool.display(),
    ));

    release_cmd()
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .code(7)
        .stdout(predicate::str::contains("Running:"))
        .stderr(predicate::str::contains("exited with status 7"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[test]
fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use kotlin_release::cli::{run, Cli};

    let cli = Cli {
        config: Some(std::path::PathBuf::from("dummy.yaml")),
        dry_run: true,
        skip_deps: true,
    };

    assert!(run(cli).is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
