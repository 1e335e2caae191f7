// tests/req_rep.rs

use rzmq_patterns::pipe;
use rzmq_patterns::socket::{SendError, Socket, SocketOption, SocketType};
use rzmq_patterns::ZmqError;

mod common;

use common::{attach_pair, data_of, frame, frame_more, peer_send};

use rzmq_patterns::pipe::PipeRef;

/// Wires a REQ and a REP socket back to back, introducing the REQ side to
/// the REP side's router with an empty identity frame. Also returns the
/// REQ socket's own pipe end: sending a request drains the inbound queue,
/// so the REQ side has to be re-armed with `read_activated` once the
/// reply lands, the way the owning event loop would.
fn connected_req_rep() -> (Socket, Socket, PipeRef) {
  let mut req = Socket::new(SocketType::Req);
  let mut rep = Socket::new(SocketType::Rep);

  let (req_end, rep_end) = pipe::pair(common::TEST_HWM);
  req_end.write(frame(b"")).unwrap();
  req_end.flush();
  req.attach_pipe(req_end.clone());
  rep.attach_pipe(rep_end);

  (req, rep, req_end)
}

#[test]
fn req_rep_round_trip() {
  common::setup();
  let (mut req, mut rep, req_end) = connected_req_rep();

  req.send(frame(b"question")).unwrap();

  let request = rep.recv().unwrap().unwrap();
  assert!(!request.is_more());
  assert_eq!(data_of(&request), b"question");

  rep.send(frame(b"answer")).unwrap();
  req.read_activated(&req_end);

  let reply = req.recv().unwrap().unwrap();
  assert!(!reply.is_more());
  assert_eq!(data_of(&reply), b"answer");

  // The cycle can repeat.
  req.send(frame(b"again")).unwrap();
  assert_eq!(data_of(&rep.recv().unwrap().unwrap()), b"again");
}

#[test]
fn req_rep_multipart_round_trip() {
  common::setup();
  let (mut req, mut rep, req_end) = connected_req_rep();

  req.send(frame_more(b"part1")).unwrap();
  req.send(frame(b"part2")).unwrap();

  assert_eq!(data_of(&rep.recv().unwrap().unwrap()), b"part1");
  assert_eq!(data_of(&rep.recv().unwrap().unwrap()), b"part2");

  rep.send(frame_more(b"re1")).unwrap();
  rep.send(frame(b"re2")).unwrap();
  req.read_activated(&req_end);

  assert_eq!(data_of(&req.recv().unwrap().unwrap()), b"re1");
  assert_eq!(data_of(&req.recv().unwrap().unwrap()), b"re2");
}

#[test]
fn req_enforces_alternation() {
  common::setup();
  let (mut req, _rep, _req_end) = connected_req_rep();

  assert!(matches!(req.recv(), Err(ZmqError::InvalidState(_))));

  req.send(frame(b"first")).unwrap();
  assert!(matches!(
    req.send(frame(b"second")),
    Err(SendError::Zmq(ZmqError::InvalidState(_)))
  ));
}

#[test]
fn rep_enforces_alternation() {
  common::setup();
  let (mut req, mut rep, _req_end) = connected_req_rep();

  assert!(matches!(
    rep.send(frame(b"unsolicited")),
    Err(SendError::Zmq(ZmqError::InvalidState(_)))
  ));

  req.send(frame(b"request")).unwrap();
  rep.recv().unwrap().unwrap();
  assert!(matches!(rep.recv(), Err(ZmqError::InvalidState(_))));
}

#[test]
fn req_relaxed_allows_resending() {
  common::setup();
  let (mut req, mut rep, req_end) = connected_req_rep();
  req.set_option(SocketOption::ReqRelaxed(true)).unwrap();

  req.send(frame(b"first")).unwrap();
  // No reply yet; a relaxed REQ may simply start over.
  req.send(frame(b"second")).unwrap();

  assert_eq!(data_of(&rep.recv().unwrap().unwrap()), b"first");
  rep.send(frame(b"stale")).unwrap();
  assert_eq!(data_of(&rep.recv().unwrap().unwrap()), b"second");
  rep.send(frame(b"fresh")).unwrap();
  req.read_activated(&req_end);

  // Both replies came down the same pipe; without correlation the first
  // one wins.
  assert_eq!(data_of(&req.recv().unwrap().unwrap()), b"stale");
}

#[test]
fn req_correlate_drops_mismatched_replies() {
  common::setup();
  let mut req = Socket::new(SocketType::Req);
  req.set_option(SocketOption::ReqCorrelate(true)).unwrap();
  let (local, peer) = attach_pair(&mut req);

  req.send(frame(b"ping")).unwrap();

  // On the wire: request id, empty delimiter, body.
  let id = peer.read().unwrap();
  assert!(id.is_more());
  assert_eq!(data_of(&id).len(), 4);
  let delimiter = peer.read().unwrap();
  assert!(delimiter.is_more());
  assert_eq!(data_of(&delimiter), b"");
  assert_eq!(data_of(&peer.read().unwrap()), b"ping");

  // A reply with the wrong id is discarded.
  peer_send(&peer, &[b"\x00\x00\x00\x00", b"", b"bogus"]);
  // The correct id is accepted.
  let id_bytes = data_of(&id);
  peer_send(&peer, &[&id_bytes, b"", b"real"]);
  req.read_activated(&local);

  let reply = req.recv().unwrap().unwrap();
  assert_eq!(data_of(&reply), b"real");
}

#[test]
fn req_has_in_ignores_mismatched_replies() {
  common::setup();
  let mut req = Socket::new(SocketType::Req);
  req.set_option(SocketOption::ReqCorrelate(true)).unwrap();
  let (local, peer) = attach_pair(&mut req);

  req.send(frame(b"ping")).unwrap();
  let id = peer.read().unwrap();
  peer.read().unwrap();
  peer.read().unwrap();

  // A buffered reply for some other request is not readable.
  peer_send(&peer, &[b"\x00\x00\x00\x00", b"", b"bogus"]);
  req.read_activated(&local);
  assert!(!req.has_in());
  assert!(req.recv().unwrap().is_none());

  let id_bytes = data_of(&id);
  peer_send(&peer, &[&id_bytes, b"", b"real"]);
  req.read_activated(&local);
  assert!(req.has_in());
  assert_eq!(data_of(&req.recv().unwrap().unwrap()), b"real");
}

#[test]
fn req_drains_stale_replies_before_sending() {
  common::setup();
  let mut req = Socket::new(SocketType::Req);
  let (local, peer) = attach_pair(&mut req);

  // A reply nobody asked for sits in the queue.
  peer_send(&peer, &[b"", b"stale"]);

  req.send(frame(b"request")).unwrap();

  // The wire carries only the new request; the stale reply was eaten.
  let delimiter = peer.read().unwrap();
  assert_eq!(data_of(&delimiter), b"");
  assert_eq!(data_of(&peer.read().unwrap()), b"request");

  peer_send(&peer, &[b"", b"real"]);
  req.read_activated(&local);
  assert_eq!(data_of(&req.recv().unwrap().unwrap()), b"real");
}

#[test]
fn rep_drops_malformed_requests() {
  common::setup();
  let mut rep = Socket::new(SocketType::Rep);

  let (local, peer) = pipe::pair(common::TEST_HWM);
  peer_send(&peer, &[b""]);
  rep.attach_pipe(local);

  // A request with no delimiter frame is dropped whole.
  peer_send(&peer, &[b"no delimiter here"]);
  assert!(rep.recv().unwrap().is_none());
}
