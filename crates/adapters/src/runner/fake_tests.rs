// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::driver::DriverConfig;
use rack_core::ServiceKey;

#[tokio::test]
async fn replays_outcomes_in_fifo_order() {
    let runner = FakeCommandRunner::new();
    runner.push_success("ps", "[1]");
    runner.push_success("ps", "[2]");

    let driver = DriverConfig::default();
    let first = runner.run(driver.ps()).await.unwrap();
    let second = runner.run(driver.ps()).await.unwrap();
    assert_eq!(first.stdout, "[1]");
    assert_eq!(second.stdout, "[2]");
}

#[tokio::test]
async fn defaults_to_empty_array_when_queue_is_dry() {
    let runner = FakeCommandRunner::new();
    let output = runner.run(DriverConfig::default().ps()).await.unwrap();
    assert!(output.success());
    assert_eq!(output.stdout, "[]");
}

#[tokio::test]
async fn outcomes_are_keyed_by_subcommand() {
    let runner = FakeCommandRunner::new();
    runner.push_failure("stop", 1, "cannot stop");
    runner.push_success("ps", "[]");

    let driver = DriverConfig::default();
    let stop = runner.run(driver.stop(&ServiceKey::new("kafka"))).await.unwrap();
    assert!(!stop.success());
    let ps = runner.run(driver.ps()).await.unwrap();
    assert!(ps.success());
}

#[tokio::test]
async fn records_every_invocation() {
    let runner = FakeCommandRunner::new();
    let driver = DriverConfig::default();
    let _ = runner.run(driver.list()).await;
    let _ = runner.run(driver.run(&ServiceKey::new("kafka:strimzi"))).await;

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].args, ["infra", "list", "--json"]);
    assert_eq!(calls[1].args, ["infra", "run", "kafka:strimzi"]);
    assert_eq!(runner.calls_for("run").len(), 1);
}

#[tokio::test]
async fn runner_errors_pass_through() {
    let runner = FakeCommandRunner::new();
    runner.push_outcome(
        "run",
        Err(RunnerError::Timeout {
            description: "camel infra run kafka".to_string(),
            secs: 120,
        }),
    );
    let err = runner
        .run(DriverConfig::default().run(&ServiceKey::new("kafka")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out after 120s"));
}
