// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service descriptors, running-service records, and per-key state.

use crate::key::ServiceKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A service the external driver knows how to provision.
///
/// Produced by discovery and immutable once loaded; the whole set is
/// replaced on re-discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Stable short name identifying the service.
    pub alias: String,
    /// Free-text description from the driver.
    pub description: String,
    /// Declared implementation variants, in driver order. Empty means the
    /// service has a single default implementation.
    pub implementations: Vec<String>,
}

impl ServiceDescriptor {
    pub fn new(
        alias: impl Into<String>,
        description: impl Into<String>,
        implementations: Vec<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            description: description.into(),
            implementations,
        }
    }

    /// Split a driver-supplied comma-separated implementation list.
    ///
    /// Whitespace around names is trimmed and empty segments are dropped,
    /// so `""` and `" , "` both yield an empty list.
    pub fn parse_implementations(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn has_implementations(&self) -> bool {
        !self.implementations.is_empty()
    }

    /// Key of one declared implementation variant.
    pub fn implementation_key(&self, implementation: &str) -> ServiceKey {
        ServiceKey::from_parts(&self.alias, implementation)
    }
}

/// One row of the driver's running-service report.
///
/// The set is rebuilt entirely on every successful poll; absence from the
/// latest poll means "not running".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningService {
    pub alias: String,
    /// Empty when the service has no implementation variants.
    pub implementation: String,
    pub description: String,
}

impl RunningService {
    /// The registry merge key: bare alias, or `alias:implementation`.
    pub fn key(&self) -> ServiceKey {
        ServiceKey::from_parts(&self.alias, &self.implementation)
    }
}

/// Lifecycle status of a service key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl ServiceStatus {
    pub fn is_running(self) -> bool {
        self == ServiceStatus::Running
    }

    /// True for the optimistic, action-initiated overlay states.
    pub fn is_transient(self) -> bool {
        matches!(self, ServiceStatus::Starting | ServiceStatus::Stopping)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Stopped => write!(f, "stopped"),
            ServiceStatus::Starting => write!(f, "starting"),
            ServiceStatus::Running => write!(f, "running"),
            ServiceStatus::Stopping => write!(f, "stopping"),
        }
    }
}

/// Connection details reported for a started service.
///
/// An open key-value map (url/host/port/credentials and whatever else the
/// driver reports); not all keys are populated for every origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams(pub BTreeMap<String, String>);

impl ConnectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolved state for one service key.
///
/// The status merges the poll-confirmed truth with any transient overlay;
/// pid and connection parameters are present only when a direct start
/// action reported them (polling never yields either).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    pub key: ServiceKey,
    pub status: ServiceStatus,
    pub pid: Option<u32>,
    pub connection_params: Option<ConnectionParams>,
    pub startup_output: Option<String>,
}

impl ServiceState {
    /// The default state for a key nothing is known about.
    pub fn stopped(key: ServiceKey) -> Self {
        Self {
            key,
            status: ServiceStatus::Stopped,
            pid: None,
            connection_params: None,
            startup_output: None,
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
