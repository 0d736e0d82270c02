// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use serde::{Deserialize, Serialize};

/// A payload of unknown type, carried opaquely. `type_tag` is an
/// optional hint for the receiving application; Spiderweb never
/// interprets `bytes` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyPayload {
    pub type_tag: Option<String>,
    pub bytes: Vec<u8>,
}

/// A single published message.
///
/// `id` is the content address used for deduplication (a random
/// 128-bit value assigned at publish time, not a hash of `payload` —
/// two publishes of identical bytes are still two distinct envelopes).
/// `seq` is monotonic and contiguous per `(publisher, topic)` starting
/// at 1; it is *not* unique across different publishers publishing to
/// the same topic — the wire format and `Storage` key only on `topic`
/// and `seq`, so two publishers racing on the same `seq` for the same
/// topic collide (last writer wins, see `Storage::insert`). `ts` is
/// the publisher's wall-clock time at publish, milliseconds since the
/// Unix epoch; it is purely informational and plays no role in
/// ordering or dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: [u8; 16],
    pub topic: String,
    pub seq: u64,
    pub ts: u64,
    pub payload: AnyPayload,
}
