// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service lifecycle orchestration.
//!
//! The controller issues driver subcommands through a [`CommandRunner`],
//! merges the parsed output into the [`ServiceRegistry`], and keeps the
//! registry fresh with a background poll loop. Every state mutation fires
//! one coalesced change notification, so a presentation layer needs a
//! single subscription regardless of whether the background loop or a user
//! action caused the change.

use crate::config::ControllerConfig;
use crate::error::ActionError;
use parking_lot::Mutex;
use rack_adapters::output::{RunningServiceRecord, ServiceListRecord};
use rack_adapters::{
    extract_json_array, runtime_diagnostics, CommandRunner, DriverInvocation, RunOutput,
};
use rack_core::{
    ServiceKey, ServiceRegistry, ServiceState, ServiceView, StartRecord, TransientState,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;

struct ControllerInner<R> {
    config: ControllerConfig,
    runner: R,
    registry: ServiceRegistry,
    in_flight: Mutex<HashSet<ServiceKey>>,
    discovery_attempted: AtomicBool,
    changes: watch::Sender<u64>,
    stopped: watch::Sender<bool>,
}

/// Orchestration façade over the driver, the registry, and the poll loop.
///
/// Cheap to clone; clones share the same registry and notification
/// channel. All operations recover their errors at this boundary: action
/// failures are returned for display, poll failures are logged and
/// retried next cycle.
pub struct ServiceController<R: CommandRunner> {
    inner: Arc<ControllerInner<R>>,
}

impl<R: CommandRunner> Clone for ServiceController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Subscription to the controller's coalesced "state changed" signal.
///
/// Dropping the listener unsubscribes it.
pub struct ChangeListener {
    rx: watch::Receiver<u64>,
}

impl ChangeListener {
    /// Wait for the next state change. Returns false once the controller
    /// is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether a change arrived since the last `changed()` call, without
    /// waiting.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

// Removes the claimed key when an action finishes, even on early return.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<ServiceKey>>,
    key: ServiceKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

impl<R: CommandRunner> ServiceController<R> {
    pub fn new(config: ControllerConfig, runner: R) -> Self {
        let (changes, _) = watch::channel(0);
        let (stopped, _) = watch::channel(false);
        Self {
            inner: Arc::new(ControllerInner {
                config,
                runner,
                registry: ServiceRegistry::new(),
                in_flight: Mutex::new(HashSet::new()),
                discovery_attempted: AtomicBool::new(false),
                changes,
                stopped,
            }),
        }
    }

    /// Read-only access to the underlying registry.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.inner.registry
    }

    /// Current three-level view hierarchy.
    pub fn view(&self) -> ServiceView {
        self.inner.registry.view()
    }

    /// Resolved state for one key.
    pub fn service_state(&self, key: &ServiceKey) -> ServiceState {
        self.inner.registry.service_state(key)
    }

    /// Subscribe to the coalesced change signal.
    pub fn subscribe(&self) -> ChangeListener {
        ChangeListener {
            rx: self.inner.changes.subscribe(),
        }
    }

    /// Enumerate available services via the driver's `list` subcommand.
    ///
    /// On failure the previous available set is kept (a transient driver
    /// error should not blank the catalog) — except on the very first
    /// attempt, where the empty set is committed since there is nothing
    /// prior to preserve.
    pub async fn discover(&self) -> Result<(), ActionError> {
        let first = !self.inner.discovery_attempted.swap(true, Ordering::SeqCst);
        match self.discover_inner().await {
            Ok(count) => {
                tracing::info!(services = count, "discovered available services");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "discovery failed");
                if first {
                    self.inner.registry.replace_available(Vec::new());
                    self.notify();
                }
                Err(err)
            }
        }
    }

    async fn discover_inner(&self) -> Result<usize, ActionError> {
        let output = self.run_driver(self.inner.config.driver.list()).await?;
        let records: Vec<ServiceListRecord> = extract_json_array(&output.stdout)?;
        let services: Vec<_> = records
            .into_iter()
            .map(ServiceListRecord::into_descriptor)
            .collect();
        let count = services.len();
        self.inner.registry.replace_available(services);
        self.notify();
        Ok(count)
    }

    /// Rebuild the running set via the driver's `ps` subcommand.
    ///
    /// Any failure clears the running set for this cycle: stale "running"
    /// rows are more misleading than a briefly empty list.
    pub async fn refresh_running(&self) -> Result<(), ActionError> {
        match self.refresh_running_inner().await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "running-service refresh failed; clearing running set");
                self.inner.registry.replace_running(Vec::new());
                self.notify();
                Err(err)
            }
        }
    }

    async fn refresh_running_inner(&self) -> Result<(), ActionError> {
        let output = self.run_driver(self.inner.config.driver.ps()).await?;
        let records: Vec<RunningServiceRecord> = extract_json_array(&output.stdout)?;
        let running: Vec<_> = records
            .into_iter()
            .map(RunningServiceRecord::into_running)
            .collect();
        tracing::debug!(running = running.len(), "merged running services");
        self.inner.registry.replace_running(running);
        self.notify();
        Ok(())
    }

    /// On-demand refresh. Discovery is retried only while it has not yet
    /// produced a non-empty catalog; running state is always refreshed.
    pub async fn refresh(&self) {
        if self.inner.registry.needs_discovery() {
            let _ = self.discover().await;
        }
        let _ = self.refresh_running().await;
    }

    /// Start a service or implementation variant.
    ///
    /// Overlays `starting` immediately; a confirming poll moves the key to
    /// `running`. On failure the overlay is reverted without waiting for a
    /// poll and the classified error is returned for display.
    pub async fn start(&self, key: impl Into<ServiceKey>) -> Result<(), ActionError> {
        let key = key.into();
        let _guard = self.claim(&key)?;

        for (name, value) in runtime_diagnostics() {
            tracing::info!(%name, %value, "container runtime environment");
        }

        tracing::info!(key = %key, "starting service");
        self.inner
            .registry
            .set_transient(key.clone(), TransientState::Starting);
        self.notify();

        let started = std::time::Instant::now();
        match self.run_driver(self.inner.config.driver.run(&key)).await {
            Ok(output) => {
                let stdout = output.stdout.trim();
                self.inner.registry.record_start(
                    key.clone(),
                    StartRecord {
                        startup_output: (!stdout.is_empty()).then(|| stdout.to_string()),
                        ..StartRecord::default()
                    },
                );
                tracing::info!(
                    key = %key,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "service start reported success"
                );
                self.notify();
                self.schedule_refresh(self.inner.config.start_confirm_delay);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "service start failed");
                for step in err.diagnostics() {
                    tracing::warn!(key = %key, "{}", step);
                }
                self.inner.registry.clear_transient(&key);
                self.notify();
                Err(err)
            }
        }
    }

    /// Stop a service or implementation variant.
    ///
    /// Overlays `stopping`; a confirming poll moves the key to `stopped`.
    /// On failure the overlay is reverted, which restores the last
    /// poll-confirmed state (`running`).
    pub async fn stop(&self, key: impl Into<ServiceKey>) -> Result<(), ActionError> {
        let key = key.into();
        let _guard = self.claim(&key)?;

        tracing::info!(key = %key, "stopping service");
        self.inner
            .registry
            .set_transient(key.clone(), TransientState::Stopping);
        self.notify();

        match self.run_driver(self.inner.config.driver.stop(&key)).await {
            Ok(_) => {
                tracing::info!(key = %key, "service stop reported success");
                self.schedule_refresh(self.inner.config.stop_confirm_delay);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "service stop failed");
                self.inner.registry.clear_transient(&key);
                self.notify();
                Err(err)
            }
        }
    }

    /// Fetch a service's logs as raw text. Does not affect state.
    pub async fn logs(&self, key: impl Into<ServiceKey>) -> Result<String, ActionError> {
        let key = key.into();
        match self.run_driver(self.inner.config.driver.logs(&key)).await {
            Ok(output) => Ok(output.stdout),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "log retrieval failed");
                Err(err)
            }
        }
    }

    /// Start the background poll loop; runs until [`shutdown`](Self::shutdown).
    pub fn spawn_poll_loop(&self) -> tokio::task::JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let mut stopped = self.inner.stopped.subscribe();
        let period = self.inner.config.poll_interval;
        tokio::spawn(async move {
            let first_tick = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(controller) = Self::upgrade(&weak) else { break };
                        // failures are logged inside and retried next cycle
                        let _ = controller.refresh_running().await;
                    }
                    _ = async { let _ = stopped.wait_for(|flag| *flag).await; } => break,
                }
            }
        })
    }

    /// Stop the poll loop and any scheduled refreshes. No further change
    /// notifications fire afterward.
    pub fn shutdown(&self) {
        let _ = self.inner.stopped.send(true);
    }

    fn upgrade(weak: &Weak<ControllerInner<R>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn claim(&self, key: &ServiceKey) -> Result<InFlightGuard<'_>, ActionError> {
        let mut in_flight = self.inner.in_flight.lock();
        if !in_flight.insert(key.clone()) {
            return Err(ActionError::Busy(key.clone()));
        }
        Ok(InFlightGuard {
            in_flight: &self.inner.in_flight,
            key: key.clone(),
        })
    }

    async fn run_driver(&self, invocation: DriverInvocation) -> Result<RunOutput, ActionError> {
        let output = self.inner.runner.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ActionError::from_failure(&output))
        }
    }

    // Schedule a delayed running-state refresh after an action; the
    // driver's own view can lag its exit.
    fn schedule_refresh(&self, delay: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let mut stopped = self.inner.stopped.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stopped.wait_for(|flag| *flag) => return,
            }
            if let Some(controller) = Self::upgrade(&weak) {
                let _ = controller.refresh_running().await;
            }
        });
    }

    fn notify(&self) {
        if *self.inner.stopped.borrow() {
            return;
        }
        self.inner.changes.send_modify(|generation| *generation += 1);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
