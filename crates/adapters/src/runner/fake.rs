// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake command runner for testing

use super::{CommandRunner, RunOutput, RunnerError};
use crate::driver::DriverInvocation;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Recorded driver invocation.
#[derive(Debug, Clone)]
pub struct RunnerCall {
    pub program: String,
    pub args: Vec<String>,
    pub description: String,
}

struct QueuedOutcome {
    result: Result<RunOutput, RunnerError>,
    delay: Option<Duration>,
}

#[derive(Default)]
struct FakeRunnerState {
    calls: Vec<RunnerCall>,
    outcomes: HashMap<String, VecDeque<QueuedOutcome>>,
}

/// Fake command runner that replays queued outcomes per subcommand.
///
/// Outcomes are keyed by an exact argument match (`"list"`, `"ps"`,
/// `"run"`, ...) and consumed in FIFO order. An invocation with no queued
/// outcome succeeds with an empty JSON array, which keeps background poll
/// loops quiet in tests that don't care about them.
#[derive(Clone, Default)]
pub struct FakeCommandRunner {
    inner: Arc<Mutex<FakeRunnerState>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next invocation whose args contain `verb`.
    pub fn push_outcome(&self, verb: &str, result: Result<RunOutput, RunnerError>) {
        self.push_queued(verb, result, None);
    }

    /// Queue a successful run with the given stdout.
    pub fn push_success(&self, verb: &str, stdout: &str) {
        self.push_outcome(verb, Ok(RunOutput::ok(stdout)));
    }

    /// Queue a failed run with the given exit code and stderr.
    pub fn push_failure(&self, verb: &str, exit_code: i32, stderr: &str) {
        self.push_outcome(verb, Ok(RunOutput::failed(exit_code, stderr)));
    }

    /// Queue an outcome that resolves only after `delay`, for tests that
    /// need to observe an in-flight action.
    pub fn push_outcome_delayed(
        &self,
        verb: &str,
        result: Result<RunOutput, RunnerError>,
        delay: Duration,
    ) {
        self.push_queued(verb, result, Some(delay));
    }

    fn push_queued(&self, verb: &str, result: Result<RunOutput, RunnerError>, delay: Option<Duration>) {
        self.inner
            .lock()
            .outcomes
            .entry(verb.to_string())
            .or_default()
            .push_back(QueuedOutcome { result, delay });
    }

    /// Get all recorded invocations.
    pub fn calls(&self) -> Vec<RunnerCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded invocations whose args contain `verb`.
    pub fn calls_for(&self, verb: &str) -> Vec<RunnerCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.args.iter().any(|arg| arg == verb))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, invocation: DriverInvocation) -> Result<RunOutput, RunnerError> {
        let outcome = {
            let mut state = self.inner.lock();
            state.calls.push(RunnerCall {
                program: invocation.program.clone(),
                args: invocation.args.clone(),
                description: invocation.description.clone(),
            });
            let verb = invocation
                .args
                .iter()
                .find(|arg| state.outcomes.contains_key(arg.as_str()))
                .cloned();
            verb.and_then(|verb| {
                state
                    .outcomes
                    .get_mut(&verb)
                    .and_then(VecDeque::pop_front)
            })
        };

        match outcome {
            Some(QueuedOutcome { result, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(RunOutput::ok("[]")),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
