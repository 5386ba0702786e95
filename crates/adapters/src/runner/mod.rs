// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver subprocess execution adapters

mod process;

pub use process::ProcessCommandRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCommandRunner, RunnerCall};

use crate::driver::DriverInvocation;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from launching or awaiting a driver subprocess.
///
/// A nonzero exit is not a runner error: the process ran and reported
/// failure, which [`RunOutput`] captures. These variants cover the cases
/// where no exit status was obtained at all.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn {command}: {message}")]
    Spawn { command: String, message: String },
    #[error("{description} timed out after {secs}s")]
    Timeout { description: String, secs: u64 },
}

/// Captured result of a completed driver subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// True when the subprocess exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Captured stderr, or a synthesized exit-code message when stderr is
    /// empty.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.exit_code {
            Some(code) => format!("process exited with code {}", code),
            None => "process terminated by signal".to_string(),
        }
    }
}

/// Adapter for running one driver subprocess to completion.
///
/// Implementations hold no shared mutable state; concurrent calls are
/// independent processes.
#[async_trait]
pub trait CommandRunner: Clone + Send + Sync + 'static {
    async fn run(&self, invocation: DriverInvocation) -> Result<RunOutput, RunnerError>;
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
