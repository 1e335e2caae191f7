// tests/radio_dish.rs

use rzmq_patterns::message::{Msg, MsgFlags};
use rzmq_patterns::session::{DishSession, RadioSession};
use rzmq_patterns::socket::{Socket, SocketType};
use rzmq_patterns::ZmqError;

mod common;

use common::{attach_pair, attach_peer, data_of};

fn published(group: &str, body: &[u8]) -> Msg {
  let mut msg = Msg::from_vec(body.to_vec());
  msg.set_group(group).unwrap();
  msg
}

#[test]
fn radio_delivers_to_joined_groups_only() {
  common::setup();
  let mut radio = Socket::new(SocketType::Radio);
  let (local1, peer1) = attach_pair(&mut radio);
  let (local2, peer2) = attach_pair(&mut radio);

  peer1.write(Msg::new_join("1").unwrap()).unwrap();
  peer1.flush();
  peer2.write(Msg::new_join("2").unwrap()).unwrap();
  peer2.flush();
  radio.read_activated(&local1);
  radio.read_activated(&local2);

  radio.send(published("1", b"for one")).unwrap();
  radio.send(published("2", b"for two")).unwrap();

  assert_eq!(data_of(&peer1.read().unwrap()), b"for one");
  assert!(peer1.read().is_none());
  assert_eq!(data_of(&peer2.read().unwrap()), b"for two");
  assert!(peer2.read().is_none());
}

#[test]
fn radio_honours_leave() {
  common::setup();
  let mut radio = Socket::new(SocketType::Radio);
  let (local, peer) = attach_pair(&mut radio);

  peer.write(Msg::new_join("g").unwrap()).unwrap();
  peer.flush();
  radio.read_activated(&local);
  radio.send(published("g", b"first")).unwrap();
  assert_eq!(data_of(&peer.read().unwrap()), b"first");

  peer.write(Msg::new_leave("g").unwrap()).unwrap();
  peer.flush();
  radio.read_activated(&local);
  radio.send(published("g", b"second")).unwrap();
  assert!(peer.read().is_none());
}

#[test]
fn radio_pipes_skip_the_termination_delay() {
  common::setup();
  let mut radio = Socket::new(SocketType::Radio);
  let (local, peer) = attach_pair(&mut radio);

  peer.write(Msg::new_join("g").unwrap()).unwrap();
  peer.flush();
  radio.read_activated(&local);
  radio.send(published("g", b"update")).unwrap();

  // Publishers never linger: even a delayed terminate drops the queue.
  local.terminate(true);
  assert!(peer.read().is_none());
}

#[test]
fn radio_cannot_receive() {
  common::setup();
  let mut radio = Socket::new(SocketType::Radio);
  assert!(matches!(radio.recv(), Err(ZmqError::InvalidSocketType(_))));
}

#[test]
fn dish_membership_is_exact_match() {
  common::setup();
  let mut dish = Socket::new(SocketType::Dish);
  let peer = attach_peer(&mut dish);
  dish.join("1").unwrap();

  // Group "10" is not group "1".
  peer.write(published("10", b"other")).unwrap();
  peer.write(published("1", b"mine")).unwrap();
  peer.flush();

  assert_eq!(data_of(&dish.recv().unwrap().unwrap()), b"mine");
  assert!(dish.recv().unwrap().is_none());
}

#[test]
fn dish_join_and_leave_validate_membership() {
  common::setup();
  let mut dish = Socket::new(SocketType::Dish);

  dish.join("g").unwrap();
  assert!(matches!(dish.join("g"), Err(ZmqError::InvalidArgument(_))));

  dish.leave("g").unwrap();
  assert!(matches!(dish.leave("g"), Err(ZmqError::InvalidArgument(_))));

  let too_long = "x".repeat(256);
  assert!(matches!(
    dish.join(&too_long),
    Err(ZmqError::InvalidArgument(_))
  ));
}

#[test]
fn dish_announces_membership_to_peers() {
  common::setup();
  let mut dish = Socket::new(SocketType::Dish);
  let peer = attach_peer(&mut dish);

  dish.join("g").unwrap();
  let join = peer.read().unwrap();
  assert!(join.is_join());
  assert_eq!(join.group(), Some("g"));

  dish.leave("g").unwrap();
  let leave = peer.read().unwrap();
  assert!(leave.is_leave());
  assert_eq!(leave.group(), Some("g"));
}

#[test]
fn dish_replays_membership_on_attach() {
  common::setup();
  let mut dish = Socket::new(SocketType::Dish);
  dish.join("early").unwrap();

  let peer = attach_peer(&mut dish);
  let join = peer.read().unwrap();
  assert!(join.is_join());
  assert_eq!(join.group(), Some("early"));
}

#[test]
fn only_dish_sockets_join_groups() {
  common::setup();
  let mut push = Socket::new(SocketType::Push);
  assert!(matches!(
    push.join("g"),
    Err(ZmqError::InvalidSocketType(_))
  ));
}

#[test]
fn radio_session_splits_published_messages() {
  common::setup();
  let mut session = RadioSession::new();

  let (group_frame, body) = session.pull_msg(published("g", b"payload")).unwrap();
  assert!(group_frame.is_more());
  assert_eq!(data_of(&group_frame), b"g");
  assert!(!body.is_more());
  assert_eq!(data_of(&body), b"payload");
}

#[test]
fn radio_session_parses_membership_commands() {
  common::setup();
  let mut session = RadioSession::new();

  let mut join = Msg::from_vec(b"\x04JOINg".to_vec());
  join.set_flags(MsgFlags::COMMAND);
  let msg = session.push_msg(join).unwrap();
  assert!(msg.is_join());
  assert_eq!(msg.group(), Some("g"));

  let mut leave = Msg::from_vec(b"\x05LEAVEg".to_vec());
  leave.set_flags(MsgFlags::COMMAND);
  let msg = session.push_msg(leave).unwrap();
  assert!(msg.is_leave());
  assert_eq!(msg.group(), Some("g"));

  let mut bogus = Msg::from_vec(b"\x03WAT".to_vec());
  bogus.set_flags(MsgFlags::COMMAND);
  assert!(matches!(
    session.push_msg(bogus),
    Err(ZmqError::ProtocolViolation(_))
  ));
}

#[test]
fn dish_session_reassembles_published_messages() {
  common::setup();
  let mut session = DishSession::new();

  let mut group_frame = Msg::from_vec(b"g".to_vec());
  group_frame.set_flags(MsgFlags::MORE);
  assert!(session.push_msg(group_frame).unwrap().is_none());

  let body = Msg::from_vec(b"payload".to_vec());
  let msg = session.push_msg(body).unwrap().unwrap();
  assert_eq!(msg.group(), Some("g"));
  assert_eq!(data_of(&msg), b"payload");
}

#[test]
fn dish_session_encodes_membership_commands() {
  common::setup();
  let mut session = DishSession::new();

  let frame = session.pull_msg(Msg::new_join("g").unwrap()).unwrap();
  assert!(frame.is_command());
  assert_eq!(data_of(&frame), b"\x04JOINg");

  let frame = session.pull_msg(Msg::new_leave("g").unwrap()).unwrap();
  assert!(frame.is_command());
  assert_eq!(data_of(&frame), b"\x05LEAVEg");
}

#[test]
fn dish_session_rejects_multipart_bodies() {
  common::setup();
  let mut session = DishSession::new();

  let mut group_frame = Msg::from_vec(b"g".to_vec());
  group_frame.set_flags(MsgFlags::MORE);
  session.push_msg(group_frame).unwrap();

  let mut body = Msg::from_vec(b"part".to_vec());
  body.set_flags(MsgFlags::MORE);
  assert!(matches!(
    session.push_msg(body),
    Err(ZmqError::ProtocolViolation(_))
  ));
}
