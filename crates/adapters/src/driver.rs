// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver invocation builder.
//!
//! The external CLI is an opaque collaborator; only the handful of
//! subcommands the lifecycle needs (`list`, `ps`, `run`, `stop`, `log`)
//! are modeled. Each invocation carries its own deadline.

use rack_core::ServiceKey;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for `list`/`ps` queries and `log` retrieval.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for `run`.
/// Starting a service may include provisioning a container, which is slow.
pub const START_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for `stop`.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// How driver subprocesses are built: program, leading arguments, working
/// directory, environment, and per-subcommand deadlines.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Driver executable name or path.
    pub program: String,
    /// Leading arguments placed before every subcommand.
    pub base_args: Vec<String>,
    /// Working directory for driver subprocesses.
    pub cwd: Option<PathBuf>,
    /// Extra environment merged over the ambient process environment;
    /// these values win on key collision.
    pub env: HashMap<String, String>,
    pub query_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    pub log_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            program: "camel".to_string(),
            base_args: vec!["infra".to_string()],
            cwd: None,
            env: HashMap::new(),
            query_timeout: QUERY_TIMEOUT,
            start_timeout: START_TIMEOUT,
            stop_timeout: STOP_TIMEOUT,
            log_timeout: QUERY_TIMEOUT,
        }
    }
}

impl DriverConfig {
    /// Config for a driver executable with default subcommands and deadlines.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Enumerate the services the driver knows how to provision.
    pub fn list(&self) -> DriverInvocation {
        self.invocation(&["list", "--json"], self.query_timeout)
    }

    /// Report the services currently running.
    pub fn ps(&self) -> DriverInvocation {
        self.invocation(&["ps", "--json"], self.query_timeout)
    }

    /// Start a service or implementation variant.
    pub fn run(&self, key: &ServiceKey) -> DriverInvocation {
        self.invocation(&["run", key.as_str()], self.start_timeout)
    }

    /// Stop a service or implementation variant.
    pub fn stop(&self, key: &ServiceKey) -> DriverInvocation {
        self.invocation(&["stop", key.as_str()], self.stop_timeout)
    }

    /// Fetch a service's logs.
    pub fn logs(&self, key: &ServiceKey) -> DriverInvocation {
        self.invocation(&["log", key.as_str()], self.log_timeout)
    }

    fn invocation(&self, subcommand: &[&str], timeout: Duration) -> DriverInvocation {
        let mut args = self.base_args.clone();
        args.extend(subcommand.iter().map(|arg| arg.to_string()));
        let description = format!("{} {}", self.program, args.join(" "));
        DriverInvocation {
            program: self.program.clone(),
            args,
            env: self.env.clone(),
            cwd: self.cwd.clone(),
            timeout,
            description,
        }
    }
}

/// One fully-specified driver subprocess.
#[derive(Debug, Clone)]
pub struct DriverInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Merged over the ambient environment; caller values win.
    pub env: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
    /// Short human label used in log lines and timeout messages.
    pub description: String,
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
