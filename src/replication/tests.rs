// =====================================================================
// File: replication/tests.rs
//
// Description:
//   Unit tests for the master-side replication pieces: newline
//   framing, fan-out ordering through the sender thread, and pruning
//   of dead follower sockets. Real loopback sockets are used so the
//   framing is exercised end to end.
// =====================================================================

use std::io::{BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use crate::replication::{FollowerRegistry, spawn_sender};

// A connected loopback pair: (master-held end, follower-held end).
fn socket_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (accepted, _) = listener.accept().unwrap();
    accepted
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    (client, accepted)
}

#[test]
fn broadcast_frames_each_entry_with_a_newline() {
    let (master_end, follower_end) = socket_pair();
    let registry = FollowerRegistry::new();
    registry.register(master_end);
    assert_eq!(registry.count(), 1);

    registry.broadcast("SET a 1");
    registry.broadcast("RPUSH q x y");

    let mut reader = BufReader::new(follower_end);
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line, "SET a 1\n");

    line.clear();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line, "RPUSH q x y\n");
}

#[test]
fn broadcast_reaches_every_registered_follower() {
    let (master_a, follower_a) = socket_pair();
    let (master_b, follower_b) = socket_pair();
    let registry = FollowerRegistry::new();
    registry.register(master_a);
    registry.register(master_b);

    registry.broadcast("SET shared 1");

    for follower in [follower_a, follower_b] {
        let mut reader = BufReader::new(follower);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "SET shared 1\n");
    }
}

#[test]
fn sender_thread_preserves_enqueue_order() {
    let (master_end, follower_end) = socket_pair();
    let registry = Arc::new(FollowerRegistry::new());
    registry.register(master_end);

    let queue = spawn_sender(Arc::clone(&registry));
    queue.enqueue("SET first 1");
    queue.enqueue("SET second 2");
    queue.enqueue("DEL first");

    let mut reader = BufReader::new(follower_end);
    let mut received = Vec::new();
    for _ in 0..3 {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        received.push(line.trim().to_string());
    }
    assert_eq!(received, vec!["SET first 1", "SET second 2", "DEL first"]);
}

#[test]
fn dead_follower_is_dropped_from_the_set() {
    let (master_end, follower_end) = socket_pair();
    let registry = FollowerRegistry::new();
    registry.register(master_end);
    drop(follower_end);

    // The first send after the peer vanishes may still land in the
    // kernel buffer; keep broadcasting until the failure surfaces.
    for _ in 0..50 {
        registry.broadcast("SET probe 1");
        if registry.count() == 0 {
            break;
        }
        sleep(Duration::from_millis(10));
    }
    assert_eq!(registry.count(), 0, "dead socket must be pruned");
}
