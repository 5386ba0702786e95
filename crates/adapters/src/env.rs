// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container-runtime environment diagnostics.
//!
//! Consumed opportunistically when a start fails; never required for
//! correct operation.

/// Environment variables worth surfacing when troubleshooting a failed
/// start: the container-runtime socket location and the runtime directory.
const DIAGNOSTIC_VARS: [&str; 2] = ["DOCKER_HOST", "XDG_RUNTIME_DIR"];

/// Collect the container-runtime variables present in the ambient
/// environment, skipping unset and empty values.
pub fn runtime_diagnostics() -> Vec<(String, String)> {
    DIAGNOSTIC_VARS
        .iter()
        .filter_map(|name| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .map(|value| (name.to_string(), value))
        })
        .collect()
}
