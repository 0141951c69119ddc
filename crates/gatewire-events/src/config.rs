//! Dispatch policy: what the pump does with envelopes it cannot decode.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Reaction to an envelope that fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log at `warn` and continue with the next envelope.
    #[default]
    Drop,
    /// Stop the pump and return the error.
    Fail,
}

/// Pump configuration. Every field has a default, so `{}` is a valid policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchPolicy {
    /// Envelopes whose tag is not registered.
    pub on_unknown: FailurePolicy,
    /// Envelopes whose body fails field coercion.
    pub on_invalid: FailurePolicy,
    /// Capacity of the decoded-event broadcast channel.
    pub broadcast_capacity: usize,
    pub shard_id: u32,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            on_unknown: FailurePolicy::Drop,
            on_invalid: FailurePolicy::Drop,
            broadcast_capacity: 256,
            shard_id: 0,
        }
    }
}

impl DispatchPolicy {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed parsing dispatch policy")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading dispatch policy {path:?}"))?;
        Self::from_json_str(&raw)
    }

    /// Fail on every undecodable envelope.
    pub fn strict(mut self) -> Self {
        self.on_unknown = FailurePolicy::Fail;
        self.on_invalid = FailurePolicy::Fail;
        self
    }
}
