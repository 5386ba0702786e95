// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON extraction from noisy driver output.
//!
//! The driver interleaves log chatter with its `--json` payload. The array
//! is located by scanning for the first `[` and the last `]`; if that
//! substring does not decode, the whole text is tried before giving up.

use rack_core::{RunningService, ServiceDescriptor};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Maximum length of the raw-output snippet carried by parse failures.
const SNIPPET_LEN: usize = 200;

/// Failure to locate or decode a JSON array in driver output.
///
/// Carries a truncated snippet of the raw text for diagnostics. Callers
/// treat this as "no data this cycle", never as a fatal condition.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON array in driver output: {snippet}")]
    NoArray { snippet: String },
    #[error("malformed JSON array in driver output ({message}): {snippet}")]
    Malformed { message: String, snippet: String },
}

impl ParseError {
    /// The raw-output snippet attached for diagnostics.
    pub fn snippet(&self) -> &str {
        match self {
            ParseError::NoArray { snippet } | ParseError::Malformed { snippet, .. } => snippet,
        }
    }
}

fn snippet(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.chars().take(SNIPPET_LEN).collect()
}

/// Decode the JSON array embedded somewhere in `raw`.
///
/// Unknown fields per record are tolerated; prefix/suffix noise around the
/// array is ignored.
pub fn extract_json_array<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, ParseError> {
    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if end > start {
            // both brackets are ASCII, so the byte range is char-aligned
            let candidate = &raw[start..=end];
            match serde_json::from_str(candidate) {
                Ok(records) => return Ok(records),
                Err(err) => {
                    // some drivers emit the array unadorned with stray
                    // brackets in the chatter; try the whole text
                    return serde_json::from_str(raw).map_err(|_| ParseError::Malformed {
                        message: err.to_string(),
                        snippet: snippet(raw),
                    });
                }
            }
        }
    }
    serde_json::from_str(raw).map_err(|_| ParseError::NoArray {
        snippet: snippet(raw),
    })
}

/// One record of the driver's `list --json` report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListRecord {
    pub alias: String,
    pub description: String,
    /// Comma-separated implementation names; absent means none.
    #[serde(default)]
    pub alias_implementation: String,
}

impl ServiceListRecord {
    pub fn into_descriptor(self) -> ServiceDescriptor {
        let implementations = ServiceDescriptor::parse_implementations(&self.alias_implementation);
        ServiceDescriptor::new(self.alias, self.description, implementations)
    }
}

/// One record of the driver's `ps --json` report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningServiceRecord {
    pub alias: String,
    pub description: String,
    /// Empty when the running service has no implementation variant.
    #[serde(default)]
    pub alias_implementation: String,
}

impl RunningServiceRecord {
    pub fn into_running(self) -> RunningService {
        RunningService {
            alias: self.alias,
            implementation: self.alias_implementation.trim().to_string(),
            description: self.description,
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
