// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State carried across a coordinator continue-as-new
//!
//! Only the ordered queue and the unlock timeout survive; grants, history and
//! withdrawal marks are rebuilt or rediscovered by the successor instance.

use super::lock::{RequesterId, ResourceId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serializable coordinator checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub resource: ResourceId,
    #[serde(with = "humantime_serde")]
    pub unlock_timeout: Duration,
    /// Requesters in arrival order
    pub queue: Vec<RequesterId>,
}

impl Checkpoint {
    /// Checkpoint for a coordinator that has not seen any arrivals yet
    pub fn initial(resource: ResourceId, unlock_timeout: Duration) -> Self {
        Self {
            resource,
            unlock_timeout,
            queue: Vec::new(),
        }
    }

    pub fn with_queue(mut self, queue: Vec<RequesterId>) -> Self {
        self.queue = queue;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<RequesterId> {
        names.iter().map(|n| RequesterId::new(*n)).collect()
    }

    #[test]
    fn initial_checkpoint_has_empty_queue() {
        let cp = Checkpoint::initial(ResourceId::new("res"), Duration::from_secs(60));
        assert!(cp.queue.is_empty());
        assert_eq!(cp.unlock_timeout, Duration::from_secs(60));
    }

    #[test]
    fn json_keeps_queue_order_and_human_duration() {
        let cp = Checkpoint::initial(ResourceId::new("res"), Duration::from_secs(90))
            .with_queue(ids(&["A", "B", "C"]));

        let json = cp.to_json().unwrap();
        assert!(json.contains("\"1m 30s\""), "unexpected json: {}", json);

        let restored = Checkpoint::from_json(&json).unwrap();
        assert_eq!(restored.queue, ids(&["A", "B", "C"]));
        assert_eq!(restored, cp);
    }

    #[test]
    fn toml_keeps_queue_order() {
        let cp = Checkpoint::initial(ResourceId::new("res"), Duration::from_secs(30))
            .with_queue(ids(&["B", "A"]));

        let text = cp.to_toml_string().unwrap();
        assert!(text.contains("unlock_timeout = \"30s\""), "unexpected toml: {}", text);

        assert_eq!(Checkpoint::from_toml_str(&text).unwrap(), cp);
    }

    #[test]
    fn from_toml_reads_hand_written_checkpoint() {
        let text = "resource = \"res\"\nunlock_timeout = \"2m\"\nqueue = [\"A\", \"B\", \"C\"]\n";

        let cp = Checkpoint::from_toml_str(text).unwrap();

        assert_eq!(cp.unlock_timeout, Duration::from_secs(120));
        assert_eq!(cp.queue, ids(&["A", "B", "C"]));
    }

    #[test]
    fn from_json_rejects_unparseable_duration() {
        let json = r#"{"resource":"res","unlock_timeout":"soon","queue":[]}"#;
        assert!(Checkpoint::from_json(json).is_err());
    }
}
