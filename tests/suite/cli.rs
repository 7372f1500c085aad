//! The `localgate` binary against suite files on disk.

use crate::common::{empty_config, localgate, write_file};

#[test]
fn help_prints_usage() {
    let out = localgate(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage: localgate"), "{stdout}");
    assert!(stdout.contains("run"), "{stdout}");
}

#[test]
fn version_prints_package_version() {
    let out = localgate(&["--version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_command_fails() {
    let out = localgate(&["frobnicate"]);
    assert!(!out.status.success());
}

#[test]
fn dummy_suite_passes() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    let suite = write_file(
        dir.path(),
        "suite.toml",
        r#"
[[instance]]
name = "default-centos"
driver = "dummy"
platform = { name = "centos", os_type = "unix" }
commands = ["converge", "verify"]
"#,
    );

    let out = localgate(&[
        "run",
        suite.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "{stdout}");
    assert!(stdout.contains("default-centos passed (2 command(s) via dummy, destroyed)"));
}

#[cfg(unix)]
#[test]
fn localhost_suite_forces_local_transport_and_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    let suite = write_file(
        dir.path(),
        "suite.toml",
        r#"
[[instance]]
name = "good-localhost"
driver = "localhost"
transport = "ssh"
platform = { name = "ubuntu", os_type = "windows" }
commands = ["echo ok"]

[[instance]]
name = "bad-localhost"
driver = "localhost"
platform = { name = "ubuntu" }
commands = ["exit 5"]
"#,
    );

    let out = localgate(&[
        "run",
        suite.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--destroy",
        "never",
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!out.status.success());
    assert!(
        stdout.contains("good-localhost passed (1 command(s) via localhost, kept)"),
        "{stdout}"
    );
    assert!(stdout.contains("bad-localhost failed"), "{stdout}");
    assert!(stdout.contains("exit code 5"), "{stdout}");
}

#[test]
fn invalid_suite_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    let suite = write_file(
        dir.path(),
        "suite.toml",
        r#"
[[instance]]
name = "no-driver"
platform = { name = "ubuntu" }
"#,
    );

    let out = localgate(&[
        "run",
        suite.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("driver"));
}
