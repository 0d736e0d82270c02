// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The node orchestrator: owns the shared state (storage, dedup, peer
//! directory, outbound sequence counters) and the five concurrent
//! activities that operate on it.
//!
//! Two activities run inside the transport implementations themselves
//! (the payload receive loop and the control receive loop, started via
//! [`DatagramTransport::start_recv`]; the fetch server, started via
//! [`UnicastTransport::start_server`]) — each following the same
//! `AtomicBool` stop-flag + `JoinHandle` + `Drop`-joins lifecycle. The
//! fourth, the heartbeat emitter, is a thread owned directly by `Node`
//! using that same pattern. The fifth, publish, has no loop at all —
//! it is a synchronous call on the caller's thread.

use crate::config::{ConfigError, NodeConfig};
use crate::dedup::Deduplicator;
use crate::error::{Error, Result};
use crate::peers::{PeerDirectory, PeerInfo};
use crate::storage::Storage;
use crate::transport::{DatagramTransport, TcpUnicastTransport, UdpMulticastTransport, UnicastTransport};
use crate::wire::{decode, encode, AnyPayload, Envelope, FetchRequest, FetchResponse, Heartbeat};
use std::collections::HashMap;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A running (or not-yet-started) Spiderweb overlay participant.
///
/// Cheap to clone: internally an `Arc` over the shared state and
/// transports, so a [`Node`] handle can be shared across threads that
/// all call [`Node::publish`].
#[derive(Clone)]
pub struct Node {
    inner: Arc<Inner>,
}

struct Inner {
    config: NodeConfig,
    advertise_addr: String,
    storage: Storage,
    dedup: Deduplicator,
    peer_directory: PeerDirectory,
    outbound_seq: Mutex<HashMap<String, u64>>,
    payload_transport: Box<dyn DatagramTransport>,
    control_transport: Box<dyn DatagramTransport>,
    fetch_transport: Box<dyn UnicastTransport>,
    running: AtomicBool,
    heartbeat_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Node {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;

        let payload_group: SocketAddrV4 = config.multicast_payload_addr.parse().map_err(|_| {
            Error::Config(ConfigError::Invalid(format!(
                "invalid multicast_payload_addr: {}",
                config.multicast_payload_addr
            )))
        })?;
        let control_group: SocketAddrV4 = config.multicast_control_addr.parse().map_err(|_| {
            Error::Config(ConfigError::Invalid(format!(
                "invalid multicast_control_addr: {}",
                config.multicast_control_addr
            )))
        })?;
        let fetch_bind: SocketAddr = config.fetch_bind_addr.parse().map_err(|_| {
            Error::Config(ConfigError::Invalid(format!(
                "invalid fetch_bind_addr: {}",
                config.fetch_bind_addr
            )))
        })?;

        let recv_poll = Duration::from_millis(config.recv_poll_ms);
        let payload_transport = UdpMulticastTransport::new(payload_group, recv_poll)?;
        let control_transport = UdpMulticastTransport::new(control_group, recv_poll)?;
        let fetch_transport = TcpUnicastTransport::new(
            fetch_bind,
            Duration::from_millis(config.fetch_timeout_ms),
            Duration::from_millis(config.fetch_server_poll_ms),
        );

        let advertise_addr = resolve_advertise_addr(&config.fetch_bind_addr);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                advertise_addr,
                storage: Storage::new(),
                dedup: Deduplicator::new(),
                peer_directory: PeerDirectory::new(),
                outbound_seq: Mutex::new(HashMap::new()),
                payload_transport: Box::new(payload_transport),
                control_transport: Box::new(control_transport),
                fetch_transport: Box::new(fetch_transport),
                running: AtomicBool::new(false),
                heartbeat_handle: Mutex::new(None),
            }),
        })
    }

    /// Starts all background activities. Idempotent: calling `start`
    /// again while already running is a no-op that returns
    /// [`Error::AlreadyStarted`].
    pub fn start(&self) -> Result<()> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyStarted);
        }

        let payload_inner = Arc::clone(&self.inner);
        self.inner.payload_transport.start_recv(Box::new(move |bytes| {
            payload_inner.handle_payload(bytes);
        }))?;

        let control_inner = Arc::clone(&self.inner);
        self.inner.control_transport.start_recv(Box::new(move |bytes| {
            control_inner.handle_control(bytes);
        }))?;

        let fetch_inner = Arc::clone(&self.inner);
        self.inner
            .fetch_transport
            .start_server(Box::new(move |req| fetch_inner.handle_fetch(req)))?;

        let heartbeat_inner = Arc::clone(&self.inner);
        let handle = thread::spawn(move || heartbeat_inner.run_heartbeat_loop());
        *self.inner.heartbeat_handle.lock().expect("node lock poisoned") = Some(handle);

        info!(node_id = %self.inner.config.node_id, "node started");
        Ok(())
    }

    /// Stops all background activities, joining every thread. Safe to
    /// call more than once.
    pub fn stop(&self) -> Result<()> {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        self.inner.payload_transport.stop_recv();
        self.inner.control_transport.stop_recv();
        self.inner.fetch_transport.stop_server();

        if let Some(handle) = self
            .inner
            .heartbeat_handle
            .lock()
            .expect("node lock poisoned")
            .take()
        {
            let _ = handle.join();
        }

        info!(node_id = %self.inner.config.node_id, "node stopped");
        Ok(())
    }

    /// Publishes `payload` to `topic`, assigning the next sequence
    /// number for this node on that topic. Send-then-store: the
    /// envelope is handed to the transport before it is written to
    /// local storage (see `DESIGN.md` for the tradeoff this implies).
    pub fn publish(&self, topic: &str, payload: AnyPayload) -> Result<()> {
        let seq = {
            let mut outbound = self
                .inner
                .outbound_seq
                .lock()
                .expect("node lock poisoned");
            let next = outbound.get(topic).copied().unwrap_or(0) + 1;
            outbound.insert(topic.to_string(), next);
            next
        };

        let envelope = Envelope {
            id: *Uuid::new_v4().as_bytes(),
            topic: topic.to_string(),
            seq,
            ts: now_millis(),
            payload,
        };

        self.inner.payload_transport.send(&encode(&envelope))?;
        self.inner.dedup.insert(envelope.id);
        self.inner.storage.append(envelope);
        Ok(())
    }

    /// A snapshot of everything currently known about other peers.
    pub fn peers(&self) -> HashMap<String, PeerInfo> {
        self.inner.peer_directory.snapshot()
    }

    /// Reads locally stored envelopes for `topic` in `[from, to]`
    /// inclusive, whether they arrived by direct multicast delivery,
    /// gap repair, or local `publish`. This is the local counterpart to
    /// `publish`'s write path and is what the fetch server itself reads
    /// from when answering peers.
    pub fn local_range(&self, topic: &str, from: u64, to: u64) -> Vec<Envelope> {
        self.inner.storage.fetch(topic, from, to)
    }
}

impl Inner {
    fn handle_payload(&self, bytes: Vec<u8>) {
        let envelope: Envelope = match decode(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("dropping unparseable payload: {}", e);
                return;
            }
        };

        if !self.dedup.insert(envelope.id) {
            debug!(topic = %envelope.topic, seq = envelope.seq, "dropping duplicate envelope");
            return;
        }

        // Read the pre-existing frontier before appending, so gap
        // detection compares the arriving seq against what was already
        // there, not against itself.
        let prev_last = self.storage.last_seq(&envelope.topic);
        let topic = envelope.topic.clone();
        let seq = envelope.seq;
        self.storage.append(envelope);

        if seq > prev_last + 1 {
            self.repair_gap(&topic, prev_last + 1, seq - 1);
        }
    }

    fn handle_control(&self, bytes: Vec<u8>) {
        let heartbeat: Heartbeat = match decode(&bytes) {
            Ok(heartbeat) => heartbeat,
            Err(e) => {
                debug!("dropping unparseable heartbeat: {}", e);
                return;
            }
        };

        if heartbeat.node_id == self.config.node_id {
            return; // our own heartbeat, looped back by multicast
        }

        self.peer_directory
            .merge_heartbeat(&heartbeat.node_id, &heartbeat.addr, &heartbeat.last_seq);
    }

    fn handle_fetch(&self, request: FetchRequest) -> FetchResponse {
        FetchResponse {
            envelopes: self.storage.fetch(&request.topic, request.from, request.to),
        }
    }

    /// Detects a gap in the range `[from, to]` inclusive and attempts
    /// to fill it from the first eligible peer in the directory
    /// snapshot. The peer directory lock is released (via `snapshot`)
    /// before any unicast I/O runs.
    fn repair_gap(&self, topic: &str, from: u64, to: u64) {
        let request = FetchRequest {
            topic: topic.to_string(),
            from,
            to,
        };

        for (node_id, peer) in self.peer_directory.snapshot() {
            if node_id == self.config.node_id {
                continue;
            }
            let Some(&peer_last) = peer.last_seq.get(topic) else {
                continue;
            };
            if peer_last < to {
                continue;
            }

            match self.fetch_transport.fetch_from(&peer.addr, &request) {
                Ok(response) if !response.envelopes.is_empty() => {
                    for envelope in response.envelopes {
                        if self.dedup.insert(envelope.id) {
                            self.storage.append(envelope);
                        }
                    }
                    return;
                }
                Ok(_) => continue,
                Err(e) => {
                    debug!(peer = %node_id, "fetch_from failed: {}", e);
                    continue;
                }
            }
        }

        warn!(topic, from, to, "no peer could fill gap, giving up");
    }

    fn run_heartbeat_loop(&self) {
        let period = Duration::from_millis(self.config.heartbeat_period_ms);
        let tick = Duration::from_millis(100).min(period);

        while self.running.load(Ordering::Relaxed) {
            self.emit_heartbeat();

            let mut waited = Duration::ZERO;
            while waited < period && self.running.load(Ordering::Relaxed) {
                thread::sleep(tick);
                waited += tick;
            }
        }
    }

    fn emit_heartbeat(&self) {
        let last_seq = self
            .outbound_seq
            .lock()
            .expect("node lock poisoned")
            .clone();

        let heartbeat = Heartbeat {
            node_id: self.config.node_id.clone(),
            addr: self.advertise_addr.clone(),
            last_seq,
        };

        if let Err(e) = self.control_transport.send(&encode(&heartbeat)) {
            debug!("heartbeat send failed: {}", e);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.payload_transport.stop_recv();
            self.control_transport.stop_recv();
            self.fetch_transport.stop_server();
            if let Some(handle) = self.heartbeat_handle.lock().expect("node lock poisoned").take() {
                let _ = handle.join();
            }
        }
    }
}

/// Milliseconds since the Unix epoch, for `Envelope::ts`. Falls back to
/// 0 on a clock set before the epoch rather than panicking.
fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Resolves the address this node advertises in its heartbeats. A
/// bind address of `0.0.0.0:<port>` isn't dialable by peers, so it's
/// replaced with this host's primary non-loopback interface address;
/// any other bind address is advertised as given.
fn resolve_advertise_addr(bind_addr: &str) -> String {
    let Some((host, port)) = bind_addr.rsplit_once(':') else {
        return bind_addr.to_string();
    };
    if host != "0.0.0.0" {
        return bind_addr.to_string();
    }
    match local_ip_address::local_ip() {
        Ok(ip) => format!("{}:{}", ip, port),
        Err(_) => bind_addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_advertise_addr_replaces_unspecified() {
        let resolved = resolve_advertise_addr("0.0.0.0:7702");
        assert!(resolved.ends_with(":7702"));
        assert_ne!(resolved, "0.0.0.0:7702");
    }

    #[test]
    fn test_resolve_advertise_addr_keeps_explicit_host() {
        assert_eq!(resolve_advertise_addr("10.0.0.5:7702"), "10.0.0.5:7702");
    }
}
