// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peer directory built from received heartbeats.
//!
//! The single most important concurrency rule in this crate: nothing
//! holds the directory's lock across network I/O. Every read used to
//! drive a unicast fetch is a cloned snapshot taken and released
//! before the first `fetch_from` call.

use std::collections::HashMap;
use std::sync::Mutex;

/// What we know about one peer from its heartbeats.
#[derive(Debug, Clone, Default)]
pub struct PeerInfo {
    pub addr: String,
    pub last_seq: HashMap<String, u64>,
}

pub struct PeerDirectory {
    peers: Mutex<HashMap<String, PeerInfo>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Merges a heartbeat's advertised topics into the existing entry
    /// for `node_id` (creating one if absent). This is a per-key
    /// overwrite, not a replace: a topic present in an earlier
    /// heartbeat but absent from this one keeps its last known value.
    pub fn merge_heartbeat(&self, node_id: &str, addr: &str, last_seq: &HashMap<String, u64>) {
        let mut peers = self.peers.lock().expect("peer directory lock poisoned");
        let entry = peers.entry(node_id.to_string()).or_default();
        entry.addr = addr.to_string();
        for (topic, seq) in last_seq {
            entry.last_seq.insert(topic.clone(), *seq);
        }
    }

    /// A point-in-time clone of the whole directory. Callers iterate
    /// this after the lock has already been released.
    pub fn snapshot(&self) -> HashMap<String, PeerInfo> {
        self.peers.lock().expect("peer directory lock poisoned").clone()
    }
}

impl Default for PeerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_creates_entry() {
        let dir = PeerDirectory::new();
        let mut seq = HashMap::new();
        seq.insert("weather".to_string(), 5);
        dir.merge_heartbeat("alice", "10.0.0.1:7702", &seq);
        let snap = dir.snapshot();
        assert_eq!(snap["alice"].addr, "10.0.0.1:7702");
        assert_eq!(snap["alice"].last_seq["weather"], 5);
    }

    #[test]
    fn test_merge_does_not_clear_absent_topics() {
        let dir = PeerDirectory::new();
        let mut first = HashMap::new();
        first.insert("weather".to_string(), 5);
        first.insert("news".to_string(), 2);
        dir.merge_heartbeat("alice", "10.0.0.1:7702", &first);

        let mut second = HashMap::new();
        second.insert("weather".to_string(), 6);
        dir.merge_heartbeat("alice", "10.0.0.1:7702", &second);

        let snap = dir.snapshot();
        assert_eq!(snap["alice"].last_seq["weather"], 6);
        assert_eq!(snap["alice"].last_seq["news"], 2);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let dir = PeerDirectory::new();
        dir.merge_heartbeat("alice", "a", &HashMap::new());
        let snap = dir.snapshot();
        dir.merge_heartbeat("bob", "b", &HashMap::new());
        assert_eq!(snap.len(), 1);
        assert_eq!(dir.snapshot().len(), 2);
    }
}
