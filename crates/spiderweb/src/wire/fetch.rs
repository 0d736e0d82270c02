// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::wire::Envelope;
use serde::{Deserialize, Serialize};

/// Unicast request to backfill a contiguous range of missing
/// envelopes for `topic`. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub topic: String,
    pub from: u64,
    pub to: u64,
}

/// Reply to a [`FetchRequest`]. An empty `envelopes` vector means the
/// responder holds nothing in the requested range, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub envelopes: Vec<Envelope>,
}
