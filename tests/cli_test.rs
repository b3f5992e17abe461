use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const ENV_VARS: [&str; 5] = [
    "PAYMENT_PROCESSOR_URL_DEFAULT",
    "PAYMENT_PROCESSOR_URL_FALLBACK",
    "SERVER_ADDR",
    "CHANNEL_CONSUMER",
    "CHANNEL_BUFFER",
];

fn router_cmd() -> Command {
    let mut cmd = Command::new(cargo_bin!());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_options() -> Result<(), Box<dyn std::error::Error>> {
    router_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--default-url"))
        .stdout(predicate::str::contains("PAYMENT_PROCESSOR_URL_FALLBACK"))
        .stdout(predicate::str::contains("--queue-capacity"));

    Ok(())
}

#[test]
fn test_missing_processor_url_fails() -> Result<(), Box<dyn std::error::Error>> {
    router_cmd()
        .args(["--fallback-url", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--default-url"));

    Ok(())
}

#[test]
fn test_invalid_pool_size_fails() -> Result<(), Box<dyn std::error::Error>> {
    router_cmd()
        .args([
            "--default-url",
            "http://127.0.0.1:1",
            "--fallback-url",
            "http://127.0.0.1:1",
            "--workers",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workers must be at least 1"));

    Ok(())
}

#[test]
#[cfg(not(feature = "storage-rocksdb"))]
fn test_db_path_without_rocksdb_warns() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut cmd = assert_cmd::Command::from_std(router_cmd());
    cmd.args(["--default-url", "http://127.0.0.1:1"])
        .args(["--fallback-url", "http://127.0.0.1:1"])
        .args(["--bind", "127.0.0.1:0"])
        .arg("--db-path")
        .arg(dir.path())
        .timeout(std::time::Duration::from_secs(2));

    cmd.assert()
        .interrupted()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested"));

    Ok(())
}
