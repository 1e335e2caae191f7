// tests/client_server.rs

use rzmq_patterns::message::Msg;
use rzmq_patterns::socket::{SendError, Socket, SocketType};
use rzmq_patterns::ZmqError;

mod common;

use common::{attach_peer, data_of, frame, frame_more, peer_send};

#[test]
fn server_tags_messages_with_peer_routing_id() {
  common::setup();
  let mut server = Socket::new(SocketType::Server);
  let peer1 = attach_peer(&mut server);
  let peer2 = attach_peer(&mut server);

  peer_send(&peer1, &[b"from one"]);
  peer_send(&peer2, &[b"from two"]);

  let first = server.recv().unwrap().unwrap();
  let second = server.recv().unwrap().unwrap();
  assert_eq!(data_of(&first), b"from one");
  assert_eq!(data_of(&second), b"from two");
  assert_ne!(first.routing_id(), 0);
  assert_ne!(second.routing_id(), 0);
  assert_ne!(first.routing_id(), second.routing_id());

  // Replies are routed by the id the request carried.
  let mut reply = Msg::from_vec(b"for two".to_vec());
  reply.set_routing_id(second.routing_id());
  server.send(reply).unwrap();

  assert!(peer1.read().is_none());
  let delivered = peer2.read().unwrap();
  assert_eq!(data_of(&delivered), b"for two");
  // The internal id never leaks back to the peer.
  assert_eq!(delivered.routing_id(), 0);
}

#[test]
fn server_rejects_unknown_routing_id() {
  common::setup();
  let mut server = Socket::new(SocketType::Server);
  let _peer = attach_peer(&mut server);

  let mut msg = frame(b"lost");
  msg.set_routing_id(0xDEAD_BEEF);
  assert!(matches!(
    server.send(msg),
    Err(SendError::Zmq(ZmqError::HostUnreachable(_)))
  ));
}

#[test]
fn server_rejects_multipart_data() {
  common::setup();
  let mut server = Socket::new(SocketType::Server);
  let _peer = attach_peer(&mut server);

  assert!(matches!(
    server.send(frame_more(b"part")),
    Err(SendError::Zmq(ZmqError::InvalidMessage(_)))
  ));
}

#[test]
fn server_drops_multipart_requests() {
  common::setup();
  let mut server = Socket::new(SocketType::Server);
  let peer = attach_peer(&mut server);

  peer_send(&peer, &[b"bad1", b"bad2"]);
  peer_send(&peer, &[b"good"]);

  let msg = server.recv().unwrap().unwrap();
  assert_eq!(data_of(&msg), b"good");
}

#[test]
fn client_round_trips_with_server() {
  common::setup();
  let mut client = Socket::new(SocketType::Client);
  let mut server = Socket::new(SocketType::Server);

  // Wire the two sockets back to back.
  let (client_end, server_end) = rzmq_patterns::pipe::pair(common::TEST_HWM);
  client.attach_pipe(client_end);
  server.attach_pipe(server_end);

  client.send(frame(b"question")).unwrap();

  let request = server.recv().unwrap().unwrap();
  assert_eq!(data_of(&request), b"question");

  let mut reply = frame(b"answer");
  reply.set_routing_id(request.routing_id());
  server.send(reply).unwrap();

  let answer = client.recv().unwrap().unwrap();
  assert_eq!(data_of(&answer), b"answer");
}

#[test]
fn client_rejects_multipart_data() {
  common::setup();
  let mut client = Socket::new(SocketType::Client);
  let _peer = attach_peer(&mut client);

  assert!(matches!(
    client.send(frame_more(b"part")),
    Err(SendError::Zmq(ZmqError::InvalidMessage(_)))
  ));
}
