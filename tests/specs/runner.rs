//! Subprocess runner specs: deadlines, spawn failures, stream capture.

use crate::prelude::*;
use rack_adapters::{CommandRunner, DriverInvocation, ProcessCommandRunner, RunnerError};
use std::collections::HashMap;
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn invocation(program: &std::path::Path, timeout: Duration) -> DriverInvocation {
    DriverInvocation {
        program: program.display().to_string(),
        args: vec!["infra".to_string(), "run".to_string(), "kafka".to_string()],
        env: HashMap::new(),
        cwd: None,
        timeout,
        description: "stub driver".to_string(),
    }
}

fn process_is_alive(pid: &str) -> bool {
    let signalable = std::process::Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false);
    if !signalable {
        return false;
    }
    // a killed-but-unreaped zombie still answers kill -0; it is dead for
    // our purposes
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !stat.contains(") Z"),
        Err(_) => false,
    }
}

async fn wait_until_dead(pid: &str) -> bool {
    for _ in 0..20 {
        if !process_is_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test]
async fn timeout_resolves_promptly_and_reaps_the_subprocess() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("pid");
    let driver = stub_driver(
        &dir,
        &format!("echo $$ > {}\nexec sleep 30", pid_file.display()),
    );

    let started = Instant::now();
    let result = ProcessCommandRunner::new()
        .run(invocation(&driver, Duration::from_secs(1)))
        .await;
    let elapsed = started.elapsed();

    let err = result.unwrap_err();
    assert!(matches!(err, RunnerError::Timeout { .. }), "got: {}", err);
    assert!(err.to_string().contains("timed out after 1s"), "got: {}", err);
    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);

    // kill-on-drop fires when the call resolves; give the kernel a moment
    let pid = fs::read_to_string(&pid_file).unwrap().trim().to_string();
    assert!(wait_until_dead(&pid).await, "pid {} survived the timeout", pid);
}

#[tokio::test]
async fn spawn_failure_resolves_without_a_deadline_wait() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-driver");

    let started = Instant::now();
    let err = ProcessCommandRunner::new()
        .run(invocation(&missing, Duration::from_secs(30)))
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::Spawn { .. }), "got: {}", err);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn stdout_and_stderr_are_captured_independently() {
    let dir = TempDir::new().unwrap();
    let driver = stub_driver(&dir, "echo payload\necho complaint >&2\nexit 4");

    let output = ProcessCommandRunner::new()
        .run(invocation(&driver, Duration::from_secs(5)))
        .await
        .unwrap();

    assert!(!output.success());
    assert_eq!(output.stdout.trim(), "payload");
    assert_eq!(output.failure_message(), "complaint");
}

#[tokio::test]
async fn invocation_env_wins_over_the_ambient_environment() {
    let dir = TempDir::new().unwrap();
    let driver = stub_driver(&dir, "echo \"$RACK_SPEC_MARKER\"");

    let mut inv = invocation(&driver, Duration::from_secs(5));
    inv.env
        .insert("RACK_SPEC_MARKER".to_string(), "overridden".to_string());
    let output = ProcessCommandRunner::new().run(inv).await.unwrap();

    assert_eq!(output.stdout.trim(), "overridden");
}
