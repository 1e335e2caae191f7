// tests/push_pull.rs

use rzmq_patterns::socket::{SendError, Socket, SocketType};
use rzmq_patterns::ZmqError;

mod common;

use common::{attach_pair, attach_peer, data_of, frame, frame_more, peer_send};

#[test]
fn push_round_robins_across_peers() {
  common::setup();
  let mut push = Socket::new(SocketType::Push);
  let peer1 = attach_peer(&mut push);
  let peer2 = attach_peer(&mut push);

  push.send(frame(b"m1")).unwrap();
  push.send(frame(b"m2")).unwrap();
  push.send(frame(b"m3")).unwrap();

  assert_eq!(data_of(&peer1.read().unwrap()), b"m1");
  assert_eq!(data_of(&peer1.read().unwrap()), b"m3");
  assert_eq!(data_of(&peer2.read().unwrap()), b"m2");
}

#[test]
fn push_hands_frame_back_without_peers() {
  common::setup();
  let mut push = Socket::new(SocketType::Push);
  match push.send(frame(b"nowhere")) {
    Err(SendError::Full(msg)) => assert_eq!(data_of(&msg), b"nowhere"),
    other => panic!("expected Full, got {:?}", other.map(|_| ())),
  }
}

#[test]
fn push_cannot_receive() {
  common::setup();
  let mut push = Socket::new(SocketType::Push);
  assert!(matches!(push.recv(), Err(ZmqError::InvalidSocketType(_))));
}

#[test]
fn pull_fair_queues_inbound_messages() {
  common::setup();
  let mut pull = Socket::new(SocketType::Pull);
  let peer1 = attach_peer(&mut pull);
  let peer2 = attach_peer(&mut pull);

  peer_send(&peer1, &[b"a"]);
  peer_send(&peer2, &[b"b"]);

  assert!(pull.has_in());
  assert_eq!(data_of(&pull.recv().unwrap().unwrap()), b"a");
  assert_eq!(data_of(&pull.recv().unwrap().unwrap()), b"b");
  assert!(pull.recv().unwrap().is_none());
}

#[test]
fn pull_cannot_send() {
  common::setup();
  let mut pull = Socket::new(SocketType::Pull);
  assert!(matches!(
    pull.send(frame(b"x")),
    Err(SendError::Zmq(ZmqError::InvalidSocketType(_)))
  ));
}

#[test]
fn scatter_rejects_multipart_data() {
  common::setup();
  let mut scatter = Socket::new(SocketType::Scatter);
  let _peer = attach_peer(&mut scatter);

  assert!(matches!(
    scatter.send(frame_more(b"part")),
    Err(SendError::Zmq(ZmqError::InvalidMessage(_)))
  ));
  scatter.send(frame(b"whole")).unwrap();
}

#[test]
fn gather_drops_multipart_messages() {
  common::setup();
  let mut gather = Socket::new(SocketType::Gather);
  let peer = attach_peer(&mut gather);

  peer_send(&peer, &[b"bad1", b"bad2"]);
  peer_send(&peer, &[b"good"]);

  assert_eq!(data_of(&gather.recv().unwrap().unwrap()), b"good");
}

#[test]
fn gather_drains_pipes_terminated_with_delay() {
  common::setup();
  let mut gather = Socket::new(SocketType::Gather);
  let (local, peer) = attach_pair(&mut gather);

  // Frames queued before a delayed shutdown are still delivered.
  peer_send(&peer, &[b"parting"]);
  local.terminate(true);
  assert_eq!(data_of(&gather.recv().unwrap().unwrap()), b"parting");
}

#[test]
fn pair_round_trips_both_directions() {
  common::setup();
  let mut a = Socket::new(SocketType::Pair);
  let peer = attach_peer(&mut a);

  a.send(frame(b"ping")).unwrap();
  assert_eq!(data_of(&peer.read().unwrap()), b"ping");

  peer_send(&peer, &[b"pong"]);
  assert_eq!(data_of(&a.recv().unwrap().unwrap()), b"pong");
}

#[test]
fn pair_refuses_a_second_peer() {
  common::setup();
  let mut a = Socket::new(SocketType::Pair);
  let peer1 = attach_peer(&mut a);
  let peer2 = attach_peer(&mut a);

  // The second pipe is shut down immediately.
  assert!(!peer2.is_active());

  a.send(frame(b"still here")).unwrap();
  assert_eq!(data_of(&peer1.read().unwrap()), b"still here");
}

#[test]
fn pair_keeps_multipart_messages_intact() {
  common::setup();
  let mut a = Socket::new(SocketType::Pair);
  let peer = attach_peer(&mut a);

  a.send(frame_more(b"head")).unwrap();
  // Nothing visible until the final frame flushes the message.
  assert!(peer.read().is_none());
  a.send(frame(b"tail")).unwrap();

  assert_eq!(data_of(&peer.read().unwrap()), b"head");
  assert_eq!(data_of(&peer.read().unwrap()), b"tail");
}
