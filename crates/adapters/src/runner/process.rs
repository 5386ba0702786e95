// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tokio subprocess implementation of [`CommandRunner`].

use super::{CommandRunner, RunOutput, RunnerError};
use crate::driver::DriverInvocation;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Runs driver invocations as real subprocesses.
///
/// Each call spawns exactly one child with piped stdout/stderr, merges the
/// invocation environment over the ambient process environment (invocation
/// values win on collision), and enforces the invocation deadline. The
/// child is killed automatically if the timeout elapses (via the tokio
/// `Child` drop implementation), so no process handle outlives the call.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, invocation: DriverInvocation) -> Result<RunOutput, RunnerError> {
        tracing::debug!(
            command = %invocation.description,
            timeout_secs = invocation.timeout.as_secs(),
            "running driver subprocess"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let output = match tokio::time::timeout(invocation.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(RunnerError::Spawn {
                    command: invocation.program,
                    message: err.to_string(),
                })
            }
            Err(_elapsed) => {
                return Err(RunnerError::Timeout {
                    description: invocation.description,
                    secs: invocation.timeout.as_secs(),
                })
            }
        };

        Ok(RunOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
