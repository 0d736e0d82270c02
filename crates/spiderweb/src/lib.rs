// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Spiderweb: a peer-to-peer pub/sub overlay for cooperating hosts on
//! a LAN.
//!
//! Publishers assign per-(publisher, topic) sequence numbers to the
//! envelopes they send over multicast. Every node keeps a directory of
//! its peers built from periodic heartbeats, and when it notices a gap
//! in an incoming sequence it backfills the missing range with a
//! unicast fetch against the first eligible peer.
//!
//! There is no central broker, no authentication, and no durability
//! beyond process lifetime — see `DESIGN.md` for the full list of
//! non-goals and the tradeoffs they imply.
//!
//! # Quick start
//!
//! ```no_run
//! use spiderweb::{AnyPayload, Node, NodeConfig};
//!
//! let config = NodeConfig {
//!     node_id: "alice".into(),
//!     ..Default::default()
//! };
//! let node = Node::new(config)?;
//! node.start()?;
//! node.publish("weather", AnyPayload { type_tag: None, bytes: b"23C".to_vec() })?;
//! node.stop()?;
//! # Ok::<(), spiderweb::Error>(())
//! ```

pub mod config;
pub mod dedup;
pub mod error;
pub mod node;
pub mod peers;
pub mod storage;
pub mod transport;
pub mod wire;

pub use config::{ConfigError, NodeConfig};
pub use dedup::Deduplicator;
pub use error::{Error, Result};
pub use node::Node;
pub use peers::{PeerDirectory, PeerInfo};
pub use storage::Storage;
pub use wire::{AnyPayload, Envelope, FetchRequest, FetchResponse, Heartbeat};
