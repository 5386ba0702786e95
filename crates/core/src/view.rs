// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-demand view projection over the registry.
//!
//! The view is a pure snapshot computed from the current registry state:
//! root → one node per service alias → zero or more implementation nodes.
//! Nothing here is stored back; a presentation layer re-projects whenever
//! it needs to render.

use crate::key::ServiceKey;
use crate::service::ServiceStatus;
use serde::Serialize;

/// Root of the projected hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceView {
    /// Service nodes, running first, then alphabetical by alias.
    pub services: Vec<ServiceNode>,
}

impl ServiceView {
    /// Look up a service node by alias.
    pub fn service(&self, alias: &str) -> Option<&ServiceNode> {
        self.services.iter().find(|node| node.alias == alias)
    }
}

/// One service alias with its merged status and implementation children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceNode {
    pub alias: String,
    pub description: String,
    pub status: ServiceStatus,
    /// Present only when the descriptor declares implementations, in
    /// declared order.
    pub implementations: Vec<ImplementationNode>,
}

impl ServiceNode {
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Whether a presentation layer should render this node collapsible.
    pub fn has_implementations(&self) -> bool {
        !self.implementations.is_empty()
    }

    /// Look up an implementation child by name.
    pub fn implementation(&self, name: &str) -> Option<&ImplementationNode> {
        self.implementations.iter().find(|node| node.name == name)
    }
}

/// One named implementation variant of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImplementationNode {
    pub name: String,
    pub key: ServiceKey,
    pub status: ServiceStatus,
}

/// Merge a service's own status with its implementation statuses.
///
/// Any running child makes the parent running; otherwise a starting child
/// wins over a stopping one, and a service with nothing going on is
/// stopped.
pub(crate) fn merge_status(own: ServiceStatus, children: &[ImplementationNode]) -> ServiceStatus {
    let statuses = std::iter::once(own).chain(children.iter().map(|child| child.status));
    let mut merged = ServiceStatus::Stopped;
    for status in statuses {
        match status {
            ServiceStatus::Running => return ServiceStatus::Running,
            ServiceStatus::Starting => merged = ServiceStatus::Starting,
            ServiceStatus::Stopping if merged == ServiceStatus::Stopped => {
                merged = ServiceStatus::Stopping;
            }
            _ => {}
        }
    }
    merged
}

/// Sort service nodes running-first, then alphabetical within each group.
pub(crate) fn sort_services(services: &mut [ServiceNode]) {
    services.sort_by(|a, b| {
        b.is_running()
            .cmp(&a.is_running())
            .then_with(|| a.alias.cmp(&b.alias))
    });
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
