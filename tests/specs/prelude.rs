//! Shared helpers for the spec suite.

use rack_adapters::DriverConfig;
use rack_engine::ControllerConfig;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Write an executable stub driver script into `dir` and return its path.
///
/// The body sees the usual driver argument shape: `$1` is the base
/// subcommand (`infra`), `$2` the verb, `$3` the service key.
pub fn stub_driver(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("driver.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}

/// Controller config around a stub driver, with deadlines and confirm
/// delays tightened for tests. The poll loop stays quiet unless a spec
/// spawns it explicitly.
pub fn stub_config(program: &Path) -> ControllerConfig {
    let mut driver = DriverConfig::new(program.display().to_string());
    driver.query_timeout = Duration::from_secs(5);
    driver.start_timeout = Duration::from_secs(5);
    driver.stop_timeout = Duration::from_secs(5);
    driver.log_timeout = Duration::from_secs(5);

    let mut config = ControllerConfig::new(driver);
    config.poll_interval = Duration::from_secs(600);
    config.start_confirm_delay = Duration::from_millis(50);
    config.stop_confirm_delay = Duration::from_millis(50);
    config
}
