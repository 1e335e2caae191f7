// tests/dealer_router.rs

use rzmq_patterns::pipe;
use rzmq_patterns::socket::{SendError, Socket, SocketOption, SocketType};
use rzmq_patterns::ZmqError;

mod common;

use common::{attach_peer, data_of, frame, frame_more, peer_send};

/// Attaches a pipe whose peer declared the given identity, the way a
/// connecting peer introduces itself with its first frame.
fn attach_identified(router: &mut Socket, identity: &[u8]) -> pipe::PipeRef {
  let (local, peer) = pipe::pair(common::TEST_HWM);
  peer_send(&peer, &[identity]);
  router.attach_pipe(local);
  peer
}

#[test]
fn dealer_round_robins_and_fair_queues() {
  common::setup();
  let mut dealer = Socket::new(SocketType::Dealer);
  let peer1 = attach_peer(&mut dealer);
  let peer2 = attach_peer(&mut dealer);

  dealer.send(frame(b"m1")).unwrap();
  dealer.send(frame(b"m2")).unwrap();
  assert_eq!(data_of(&peer1.read().unwrap()), b"m1");
  assert_eq!(data_of(&peer2.read().unwrap()), b"m2");

  peer_send(&peer1, &[b"r1"]);
  peer_send(&peer2, &[b"r2"]);
  assert_eq!(data_of(&dealer.recv().unwrap().unwrap()), b"r1");
  assert_eq!(data_of(&dealer.recv().unwrap().unwrap()), b"r2");
}

#[test]
fn router_prefixes_messages_with_peer_identity() {
  common::setup();
  let mut router = Socket::new(SocketType::Router);
  let peer = attach_identified(&mut router, b"peer-1");

  peer_send(&peer, &[b"hello"]);

  let id = router.recv().unwrap().unwrap();
  assert!(id.is_more());
  assert_eq!(data_of(&id), b"peer-1");
  let body = router.recv().unwrap().unwrap();
  assert!(!body.is_more());
  assert_eq!(data_of(&body), b"hello");
}

#[test]
fn router_routes_replies_by_identity() {
  common::setup();
  let mut router = Socket::new(SocketType::Router);
  let peer1 = attach_identified(&mut router, b"alpha");
  let peer2 = attach_identified(&mut router, b"beta");

  router.send(frame_more(b"beta")).unwrap();
  router.send(frame(b"for beta")).unwrap();

  assert!(peer1.read().is_none());
  assert_eq!(data_of(&peer2.read().unwrap()), b"for beta");
}

#[test]
fn router_assigns_identity_to_anonymous_peers() {
  common::setup();
  let mut router = Socket::new(SocketType::Router);
  let peer = attach_identified(&mut router, b"");

  peer_send(&peer, &[b"payload"]);

  let id = router.recv().unwrap().unwrap();
  // Synthetic identities are 5 bytes with a zero lead byte, so they can
  // never collide with an application-chosen identity.
  let id_bytes = data_of(&id);
  assert_eq!(id_bytes.len(), 5);
  assert_eq!(id_bytes[0], 0);
  assert_eq!(data_of(&router.recv().unwrap().unwrap()), b"payload");

  // The synthetic identity routes back to the peer.
  router.send(frame_more(&id_bytes)).unwrap();
  router.send(frame(b"reply")).unwrap();
  assert_eq!(data_of(&peer.read().unwrap()), b"reply");
}

#[test]
fn router_silently_drops_unroutable_messages() {
  common::setup();
  let mut router = Socket::new(SocketType::Router);
  let _peer = attach_identified(&mut router, b"known");

  router.send(frame_more(b"unknown")).unwrap();
  router.send(frame(b"dropped")).unwrap();
}

#[test]
fn router_mandatory_reports_unroutable_messages() {
  common::setup();
  let mut router = Socket::new(SocketType::Router);
  router.set_option(SocketOption::RouterMandatory(true)).unwrap();
  let _peer = attach_identified(&mut router, b"known");

  assert!(matches!(
    router.send(frame_more(b"unknown")),
    Err(SendError::Zmq(ZmqError::HostUnreachable(_)))
  ));
}

#[test]
fn router_rejects_duplicate_identity_without_handover() {
  common::setup();
  let mut router = Socket::new(SocketType::Router);
  let peer1 = attach_identified(&mut router, b"dup");
  let _peer2 = attach_identified(&mut router, b"dup");

  router.send(frame_more(b"dup")).unwrap();
  router.send(frame(b"message")).unwrap();

  // The original peer keeps the identity.
  assert_eq!(data_of(&peer1.read().unwrap()), b"message");
}

#[test]
fn router_handover_lets_new_peer_take_identity() {
  common::setup();
  let mut router = Socket::new(SocketType::Router);
  router.set_option(SocketOption::RouterHandover(true)).unwrap();
  let peer1 = attach_identified(&mut router, b"dup");
  let peer2 = attach_identified(&mut router, b"dup");

  // The old connection is shut down; the identity now names the new one.
  assert!(!peer1.is_active());

  router.send(frame_more(b"dup")).unwrap();
  router.send(frame(b"message")).unwrap();
  assert_eq!(data_of(&peer2.read().unwrap()), b"message");
}

#[test]
fn dealer_to_router_round_trip() {
  common::setup();
  let mut dealer = Socket::new(SocketType::Dealer);
  let mut router = Socket::new(SocketType::Router);

  let (dealer_end, router_end) = pipe::pair(common::TEST_HWM);
  // The dealer side introduces itself before the router reads anything.
  dealer_end.write(frame(b"dealer-1")).unwrap();
  dealer_end.flush();
  dealer.attach_pipe(dealer_end);
  router.attach_pipe(router_end);

  dealer.send(frame(b"request")).unwrap();

  let id = router.recv().unwrap().unwrap();
  assert_eq!(data_of(&id), b"dealer-1");
  let body = router.recv().unwrap().unwrap();
  assert_eq!(data_of(&body), b"request");

  router.send(frame_more(b"dealer-1")).unwrap();
  router.send(frame(b"response")).unwrap();

  assert_eq!(data_of(&dealer.recv().unwrap().unwrap()), b"response");
}
