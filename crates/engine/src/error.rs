// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action error taxonomy and environment-failure classification.

use rack_adapters::{ParseError, RunOutput, RunnerError};
use rack_core::ServiceKey;
use thiserror::Error;

/// Stderr markers indicating the container runtime itself is unreachable,
/// rather than the requested service being at fault.
const ENVIRONMENT_MARKERS: [&str; 3] = [
    "Could not find a valid Docker environment",
    "testcontainers",
    "DockerClientProviderStrategy",
];

/// Troubleshooting steps surfaced alongside an environment failure.
const ENVIRONMENT_DIAGNOSTICS: &[&str] = &[
    "If using Podman: make sure the socket is available and the environment variables are set",
    "If using Docker: ensure the Docker daemon is running and accessible",
    "Try running the same command in a terminal first to verify the setup",
];

/// Errors surfaced to callers of controller actions.
///
/// Every variant is recoverable: actions report and revert, the poll loop
/// logs and retries next cycle. Display strings are suitable for direct
/// display to a user.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Driver executable could not be launched.
    #[error("{0}")]
    Spawn(String),
    /// Driver did not finish before its deadline.
    #[error("{0}")]
    Timeout(String),
    /// Driver ran and reported failure.
    #[error("{0}")]
    Failed(String),
    /// Driver failure caused by an unreachable container runtime.
    #[error("Docker or Podman connection issue: {message}")]
    Environment { message: String },
    /// Driver output did not contain a decodable JSON array.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Another start/stop is already in flight for this key.
    #[error("an action is already in progress for {0}")]
    Busy(ServiceKey),
}

impl ActionError {
    /// Classify a completed-but-failed driver run.
    pub fn from_failure(output: &RunOutput) -> Self {
        let message = output.failure_message();
        if is_environment_failure(&message) {
            ActionError::Environment { message }
        } else {
            ActionError::Failed(message)
        }
    }

    /// Troubleshooting steps for a secondary diagnostics affordance;
    /// empty for everything but environment failures.
    pub fn diagnostics(&self) -> &'static [&'static str] {
        match self {
            ActionError::Environment { .. } => ENVIRONMENT_DIAGNOSTICS,
            _ => &[],
        }
    }
}

impl From<RunnerError> for ActionError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Spawn { .. } => ActionError::Spawn(err.to_string()),
            RunnerError::Timeout { .. } => ActionError::Timeout(err.to_string()),
        }
    }
}

/// True when a driver failure message matches a known container-runtime
/// marker.
pub fn is_environment_failure(message: &str) -> bool {
    ENVIRONMENT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
