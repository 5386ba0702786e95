// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller configuration.

use rack_adapters::DriverConfig;
use std::time::Duration;

/// Default interval between background polls of running services.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default delay before the post-start confirmation poll.
/// The driver's reported state may lag its own exit.
pub const START_CONFIRM_DELAY: Duration = Duration::from_secs(2);

/// Default delay before the post-stop confirmation poll.
pub const STOP_CONFIRM_DELAY: Duration = Duration::from_secs(1);

/// Tunables for a [`ServiceController`](crate::ServiceController).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub driver: DriverConfig,
    pub poll_interval: Duration,
    pub start_confirm_delay: Duration,
    pub stop_confirm_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            poll_interval: POLL_INTERVAL,
            start_confirm_delay: START_CONFIRM_DELAY,
            stop_confirm_delay: STOP_CONFIRM_DELAY,
        }
    }
}

impl ControllerConfig {
    /// Config wrapping the given driver with default timings.
    pub fn new(driver: DriverConfig) -> Self {
        Self {
            driver,
            ..Self::default()
        }
    }
}
