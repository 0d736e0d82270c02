// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory envelope store, keyed by topic.
//!
//! Non-goal: durability. Everything here is lost on process exit, by
//! design — see the crate-level docs.

use crate::wire::Envelope;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Two-level map: topic -> (seq -> envelope), behind a single mutex.
/// Storage is its own lock domain: no other lock in this crate is held
/// while a `Storage` call is in flight, and no `Storage` call blocks on
/// anything but this mutex.
///
/// `seq` is keyed per topic only, not per `(publisher, topic)`: two
/// different publishers racing on the same `seq` for the same topic
/// collide at the same slot (see `append`).
pub struct Storage {
    inner: Mutex<HashMap<String, BTreeMap<u64, Envelope>>>,
}

impl Storage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Highest sequence number stored for `topic`, or `0` if none.
    pub fn last_seq(&self, topic: &str) -> u64 {
        let inner = self.inner.lock().expect("storage lock poisoned");
        inner
            .get(topic)
            .and_then(|seqs| seqs.keys().next_back().copied())
            .unwrap_or(0)
    }

    /// Stores `envelope` under `(topic, seq)`, overwriting any existing
    /// entry there. Idempotent for an identical envelope; for two
    /// distinct envelopes landing on the same `(topic, seq)` — e.g. two
    /// publishers racing on the same sequence number for a shared
    /// topic — the last writer wins. Not expected once `uuid` dedup is
    /// correct, but not guarded against here either (matches the
    /// original storage contract).
    pub fn append(&self, envelope: Envelope) {
        let mut inner = self.inner.lock().expect("storage lock poisoned");
        inner
            .entry(envelope.topic.clone())
            .or_default()
            .insert(envelope.seq, envelope);
    }

    /// Envelopes for `topic` with `from <= seq <= to`, in ascending seq
    /// order. Gaps in the stored range are simply absent from the
    /// result (the caller does not get placeholders). `from > to`
    /// returns empty rather than panicking on an inverted range.
    pub fn fetch(&self, topic: &str, from: u64, to: u64) -> Vec<Envelope> {
        if from > to {
            return Vec::new();
        }
        let inner = self.inner.lock().expect("storage lock poisoned");
        inner
            .get(topic)
            .map(|seqs| {
                seqs.range(from..=to)
                    .map(|(_, envelope)| envelope.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::AnyPayload;

    fn envelope(topic: &str, seq: u64, bytes: Vec<u8>) -> Envelope {
        Envelope {
            id: uuid::Uuid::new_v4().into_bytes(),
            topic: topic.to_string(),
            seq,
            ts: 0,
            payload: AnyPayload {
                type_tag: None,
                bytes,
            },
        }
    }

    #[test]
    fn test_last_seq_tracks_the_highest_appended() {
        let storage = Storage::new();
        storage.append(envelope("t", 1, vec![]));
        assert_eq!(storage.last_seq("t"), 1);
        storage.append(envelope("t", 3, vec![]));
        assert_eq!(storage.last_seq("t"), 3);
        storage.append(envelope("t", 2, vec![])); // out of order, still < current max
        assert_eq!(storage.last_seq("t"), 3);
    }

    #[test]
    fn test_last_seq_on_unknown_topic_is_zero() {
        let storage = Storage::new();
        assert_eq!(storage.last_seq("nope"), 0);
    }

    #[test]
    fn test_fetch_returns_only_present_seqs_in_order() {
        let storage = Storage::new();
        storage.append(envelope("t", 1, vec![]));
        storage.append(envelope("t", 3, vec![])); // seq 2 missing
        let got = storage.fetch("t", 1, 3);
        assert_eq!(got.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_fetch_on_unknown_topic_is_empty() {
        let storage = Storage::new();
        assert!(storage.fetch("nope", 1, 10).is_empty());
    }

    #[test]
    fn test_fetch_with_from_greater_than_to_is_empty() {
        let storage = Storage::new();
        storage.append(envelope("t", 1, vec![]));
        assert!(storage.fetch("t", 5, 1).is_empty());
    }

    #[test]
    fn test_append_on_same_topic_and_seq_last_writer_wins() {
        let storage = Storage::new();
        storage.append(envelope("t", 1, b"from-alice".to_vec()));
        storage.append(envelope("t", 1, b"from-bob".to_vec()));
        let got = storage.fetch("t", 1, 1);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].payload.bytes, b"from-bob");
    }
}
