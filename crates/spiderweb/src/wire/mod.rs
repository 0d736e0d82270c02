// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire message types and their binary encoding.

mod codec;
mod envelope;
mod fetch;
mod heartbeat;

pub use codec::{decode, encode};
pub use envelope::{AnyPayload, Envelope};
pub use fetch::{FetchRequest, FetchResponse};
pub use heartbeat::Heartbeat;
