use spiderweb::NodeConfig;
use std::sync::atomic::{AtomicU16, Ordering};

static NEXT_PORT: AtomicU16 = AtomicU16::new(18000);
static NEXT_GROUP: AtomicU16 = AtomicU16::new(1);

/// Builds a config for a fresh, isolated node: a distinct multicast
/// group pair (so unrelated test runs never cross-talk) and distinct
/// fetch/heartbeat/poll timings tuned short for fast tests.
pub fn test_config(node_id: &str) -> NodeConfig {
    let group = NEXT_GROUP.fetch_add(1, Ordering::Relaxed);
    let payload_port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);
    let control_port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);
    let fetch_port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);

    NodeConfig {
        node_id: node_id.to_string(),
        multicast_payload_addr: format!("239.27.{}.1:{}", group, payload_port),
        multicast_control_addr: format!("239.27.{}.2:{}", group, control_port),
        fetch_bind_addr: format!("127.0.0.1:{}", fetch_port),
        heartbeat_period_ms: 100,
        fetch_timeout_ms: 500,
        recv_poll_ms: 20,
        fetch_server_poll_ms: 20,
    }
}

/// A config that joins an already-created node's payload/control
/// groups, so the two nodes can actually talk to each other, with its
/// own distinct fetch port.
pub fn joining_config(node_id: &str, existing: &NodeConfig) -> NodeConfig {
    let fetch_port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);
    NodeConfig {
        node_id: node_id.to_string(),
        multicast_payload_addr: existing.multicast_payload_addr.clone(),
        multicast_control_addr: existing.multicast_control_addr.clone(),
        fetch_bind_addr: format!("127.0.0.1:{}", fetch_port),
        ..existing.clone()
    }
}
