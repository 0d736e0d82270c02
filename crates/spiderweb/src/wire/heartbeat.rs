// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Periodic announcement of a node's identity, fetch address, and the
/// highest sequence number it has locally published per topic.
///
/// Only topics this node has *published to* are included — `last_seq`
/// is built from this node's own outbound sequence counters, not from
/// everything it has ever stored (a node can receive and store a topic
/// it never publishes to, and that topic does not appear here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub node_id: String,
    pub addr: String,
    pub last_seq: HashMap<String, u64>,
}
