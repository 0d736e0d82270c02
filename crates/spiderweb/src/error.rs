// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the library's caller-facing operations.
//!
//! Most runtime faults encountered by the node's background activities
//! (transient network errors, malformed wire messages, duplicate
//! envelopes, gaps nothing could fill) are logged and swallowed rather
//! than surfaced here — see [`crate::node`]. `Error` covers the small
//! set of synchronous operations that can meaningfully fail: loading
//! configuration, constructing and starting a node, initializing a
//! transport.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport already started")]
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, Error>;
