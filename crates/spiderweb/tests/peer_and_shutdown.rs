mod common;

use common::test_config;
use spiderweb::Node;
use std::thread;
use std::time::{Duration, Instant};

/// S5: a node's own heartbeat, looped back by multicast, never creates
/// a self-entry in its peer directory.
#[test]
fn own_heartbeat_is_not_added_as_a_peer() {
    let mut config = test_config("echo");
    config.heartbeat_period_ms = 80;

    let node = Node::new(config).expect("node");
    node.start().expect("start");

    // A couple of heartbeat periods is enough for at least one
    // self-loopback to have arrived on the control channel.
    thread::sleep(Duration::from_millis(350));

    assert!(
        !node.peers().contains_key("echo"),
        "node must not appear in its own peer directory"
    );

    node.stop().unwrap();
}

/// S6: stop() joins every background activity promptly, and peers()
/// remains callable (returning the last known snapshot) afterwards.
#[test]
fn stop_terminates_promptly_and_peers_stays_callable() {
    let config = test_config("shutdown_node");
    let node = Node::new(config).expect("node");
    node.start().expect("start");

    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    node.stop().expect("stop");
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "stop() took too long to join background activities"
    );

    // Still callable after stop, and idempotent.
    assert!(node.peers().is_empty());
    node.stop().expect("stop is idempotent");
}
