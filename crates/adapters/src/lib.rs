// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rack-adapters: external I/O for the service lifecycle
//!
//! Everything that touches the operating system lives here: driver
//! subprocess execution, the invocation builder for the driver's
//! subcommands, extraction of JSON payloads from its noisy output, and
//! container-runtime environment diagnostics.

pub mod driver;
pub mod env;
pub mod output;
pub mod runner;

pub use driver::{DriverConfig, DriverInvocation};
pub use env::runtime_diagnostics;
pub use output::{extract_json_array, ParseError, RunningServiceRecord, ServiceListRecord};
pub use runner::{CommandRunner, ProcessCommandRunner, RunOutput, RunnerError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use runner::{FakeCommandRunner, RunnerCall};
