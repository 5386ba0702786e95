// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory model of available and running services.
//!
//! The registry is the single shared mutable structure in the system. All
//! mutation methods replace or update state atomically under one lock, so a
//! concurrent reader never observes a mix of old available-services and new
//! running-services. Transient overlays (`starting`/`stopping`) are stamped
//! with the poll generation at which they were set and dropped by the next
//! running-set merge, which keeps the reconciliation rule explicit.

use crate::key::ServiceKey;
use crate::service::{
    ConnectionParams, RunningService, ServiceDescriptor, ServiceState, ServiceStatus,
};
use crate::view::{self, ImplementationNode, ServiceNode, ServiceView};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// Monotonic counter identifying one completed poll merge.
pub type PollGeneration = u64;

/// Optimistic overlay state set by a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientState {
    Starting,
    Stopping,
}

impl TransientState {
    fn status(self) -> ServiceStatus {
        match self {
            TransientState::Starting => ServiceStatus::Starting,
            TransientState::Stopping => ServiceStatus::Stopping,
        }
    }
}

/// Artifacts reported by a successful start action.
///
/// Polling never yields any of these; they are retained while the key is
/// observed running (with one poll cycle of grace for the driver's own
/// state to catch up with its exit).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartRecord {
    pub pid: Option<u32>,
    pub connection_params: Option<ConnectionParams>,
    pub startup_output: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Overlay {
    state: TransientState,
    generation: PollGeneration,
}

#[derive(Debug, Clone)]
struct StampedStart {
    record: StartRecord,
    generation: PollGeneration,
}

#[derive(Default)]
struct RegistryInner {
    available: BTreeMap<String, ServiceDescriptor>,
    running: HashMap<ServiceKey, RunningService>,
    overlays: HashMap<ServiceKey, Overlay>,
    starts: HashMap<ServiceKey, StampedStart>,
    generation: PollGeneration,
}

impl RegistryInner {
    fn status_of(&self, key: &ServiceKey) -> ServiceStatus {
        if let Some(overlay) = self.overlays.get(key) {
            // Stale overlays are pruned on replace_running; the stamp check
            // keeps the supersession rule explicit.
            if overlay.generation >= self.generation {
                return overlay.state.status();
            }
        }
        if self.running.contains_key(key) {
            ServiceStatus::Running
        } else {
            ServiceStatus::Stopped
        }
    }
}

/// Shared in-memory store of discovered and running services.
#[derive(Default)]
pub struct ServiceRegistry {
    inner: Mutex<RegistryInner>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the discovery-derived set of available services.
    pub fn replace_available(&self, services: Vec<ServiceDescriptor>) {
        let available = services
            .into_iter()
            .map(|descriptor| (descriptor.alias.clone(), descriptor))
            .collect();
        self.inner.lock().available = available;
    }

    /// Atomically replace the running set from the latest poll.
    ///
    /// Bumps the poll generation, drops every transient overlay stamped
    /// with an earlier generation, and prunes start artifacts for keys no
    /// longer observed running (keeping those recorded since the previous
    /// poll, since the driver's report can lag a fresh start).
    pub fn replace_running(&self, records: Vec<RunningService>) -> PollGeneration {
        let mut inner = self.inner.lock();
        let previous = inner.generation;
        inner.generation += 1;
        inner.running = records
            .into_iter()
            .map(|record| (record.key(), record))
            .collect();
        let generation = inner.generation;
        inner
            .overlays
            .retain(|_, overlay| overlay.generation >= generation);
        let running = std::mem::take(&mut inner.running);
        inner
            .starts
            .retain(|key, start| running.contains_key(key) || start.generation >= previous);
        inner.running = running;
        generation
    }

    /// Overlay an optimistic `starting`/`stopping` state for a key.
    ///
    /// The overlay is superseded by the next `replace_running`.
    pub fn set_transient(&self, key: ServiceKey, state: TransientState) {
        let mut inner = self.inner.lock();
        let generation = inner.generation;
        inner.overlays.insert(key, Overlay { state, generation });
    }

    /// Drop a key's overlay immediately (failed action revert).
    pub fn clear_transient(&self, key: &ServiceKey) {
        self.inner.lock().overlays.remove(key);
    }

    /// Record the artifacts of a successful start action.
    pub fn record_start(&self, key: ServiceKey, record: StartRecord) {
        let mut inner = self.inner.lock();
        let generation = inner.generation;
        inner.starts.insert(key, StampedStart { record, generation });
    }

    /// Resolved state for one key; overlay wins over polled truth.
    pub fn service_state(&self, key: &ServiceKey) -> ServiceState {
        let inner = self.inner.lock();
        let status = inner.status_of(key);
        let mut state = ServiceState::stopped(key.clone());
        state.status = status;
        if let Some(start) = inner.starts.get(key) {
            state.pid = start.record.pid;
            state.connection_params = start.record.connection_params.clone();
            state.startup_output = start.record.startup_output.clone();
        }
        state
    }

    /// Snapshot of the available-service descriptors, alphabetical.
    pub fn available(&self) -> Vec<ServiceDescriptor> {
        self.inner.lock().available.values().cloned().collect()
    }

    /// True while discovery has not yet produced a non-empty catalog.
    pub fn needs_discovery(&self) -> bool {
        self.inner.lock().available.is_empty()
    }

    /// Number of keys observed running in the latest poll.
    pub fn running_count(&self) -> usize {
        self.inner.lock().running.len()
    }

    /// The generation of the latest completed poll merge.
    pub fn generation(&self) -> PollGeneration {
        self.inner.lock().generation
    }

    /// Project the three-level view hierarchy from the current snapshot.
    pub fn view(&self) -> ServiceView {
        let inner = self.inner.lock();
        let mut services: Vec<ServiceNode> = inner
            .available
            .values()
            .map(|descriptor| {
                let implementations: Vec<ImplementationNode> = descriptor
                    .implementations
                    .iter()
                    .map(|name| {
                        let key = descriptor.implementation_key(name);
                        let status = inner.status_of(&key);
                        ImplementationNode {
                            name: name.clone(),
                            key,
                            status,
                        }
                    })
                    .collect();
                let own = inner.status_of(&ServiceKey::new(descriptor.alias.clone()));
                ServiceNode {
                    alias: descriptor.alias.clone(),
                    description: descriptor.description.clone(),
                    status: view::merge_status(own, &implementations),
                    implementations,
                }
            })
            .collect();
        view::sort_services(&mut services);
        ServiceView { services }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
