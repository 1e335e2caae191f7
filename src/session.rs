// src/session.rs

//! Wire-format adapters for RADIO/DISH.
//!
//! The group tag carried on [`Msg`](crate::message::Msg) never appears on
//! the wire as-is. A published message travels as two frames (group, then
//! body), and membership changes travel as JOIN/LEAVE command frames.
//! These adapters sit between a socket and its wire pipe and translate in
//! both directions; they are pure frame transforms with no I/O of their
//! own. `push_msg` accepts frames arriving from the wire, `pull_msg`
//! produces frames to put on the wire.

use crate::error::ZmqError;
use crate::message::{Msg, MsgFlags, MsgKind, MAX_GROUP_LENGTH};
use bytes::Bytes;

const JOIN_COMMAND: &[u8] = b"\x04JOIN";
const LEAVE_COMMAND: &[u8] = b"\x05LEAVE";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
enum DishDecodeState {
  /// Expecting the group frame of the next message.
  #[default]
  Group,
  /// Group consumed; expecting the body frame.
  Body,
}

/// Frame adapter for the DISH side of the wire.
#[derive(Default)]
pub struct DishSession {
  state: DishDecodeState,
  pending_group: String,
}

impl DishSession {
  pub fn new() -> Self {
    Self::default()
  }

  /// Feeds one frame arriving from a RADIO peer. The group frame is
  /// absorbed (`Ok(None)`); the body frame comes back tagged with it.
  pub fn push_msg(&mut self, mut msg: Msg) -> Result<Option<Msg>, ZmqError> {
    match self.state {
      DishDecodeState::Group => {
        if !msg.is_more() {
          return Err(ZmqError::ProtocolViolation(
            "published message is missing its body frame".into(),
          ));
        }
        let data = msg.data().unwrap_or(&[]);
        if data.len() > MAX_GROUP_LENGTH {
          return Err(ZmqError::ProtocolViolation(format!(
            "group frame exceeds {} bytes",
            MAX_GROUP_LENGTH
          )));
        }
        let group = std::str::from_utf8(data)
          .map_err(|_| ZmqError::ProtocolViolation("group name is not valid UTF-8".into()))?;
        self.pending_group = group.to_owned();
        self.state = DishDecodeState::Body;
        Ok(None)
      }
      DishDecodeState::Body => {
        if msg.is_more() {
          self.state = DishDecodeState::Group;
          return Err(ZmqError::ProtocolViolation(
            "published message has more than one body frame".into(),
          ));
        }
        msg.set_group(&self.pending_group)?;
        self.state = DishDecodeState::Group;
        Ok(Some(msg))
      }
    }
  }

  /// Converts an outbound control message into its wire frame. Data
  /// messages pass through untouched.
  pub fn pull_msg(&mut self, msg: Msg) -> Result<Msg, ZmqError> {
    let command = match msg.kind() {
      MsgKind::Join => JOIN_COMMAND,
      MsgKind::Leave => LEAVE_COMMAND,
      MsgKind::Data => return Ok(msg),
    };
    let group = msg.group().unwrap_or("");
    let mut frame = Vec::with_capacity(command.len() + group.len());
    frame.extend_from_slice(command);
    frame.extend_from_slice(group.as_bytes());
    let mut command_msg = Msg::from_vec(frame);
    command_msg.set_flags(MsgFlags::COMMAND);
    Ok(command_msg)
  }

  /// Drops any partially decoded message (after a reconnect).
  pub fn reset(&mut self) {
    self.state = DishDecodeState::Group;
    self.pending_group.clear();
  }
}

/// Frame adapter for the RADIO side of the wire.
#[derive(Default)]
pub struct RadioSession {}

impl RadioSession {
  pub fn new() -> Self {
    Self::default()
  }

  /// Feeds one frame arriving from a DISH peer. JOIN/LEAVE command frames
  /// become group control messages; anything else passes through.
  pub fn push_msg(&mut self, msg: Msg) -> Result<Msg, ZmqError> {
    if !msg.is_command() {
      return Ok(msg);
    }
    let data = msg.data().unwrap_or(&[]);
    if let Some(group) = data.strip_prefix(JOIN_COMMAND) {
      let group = std::str::from_utf8(group)
        .map_err(|_| ZmqError::ProtocolViolation("group name is not valid UTF-8".into()))?;
      return Msg::new_join(group);
    }
    if let Some(group) = data.strip_prefix(LEAVE_COMMAND) {
      let group = std::str::from_utf8(group)
        .map_err(|_| ZmqError::ProtocolViolation("group name is not valid UTF-8".into()))?;
      return Msg::new_leave(group);
    }
    Err(ZmqError::ProtocolViolation(
      "unrecognised command frame".into(),
    ))
  }

  /// Converts an outbound published message into its two wire frames:
  /// the group, then the body.
  pub fn pull_msg(&mut self, msg: Msg) -> Result<(Msg, Msg), ZmqError> {
    if msg.is_more() {
      return Err(ZmqError::ProtocolViolation(
        "published messages are single-frame".into(),
      ));
    }
    let group = msg.group().unwrap_or("");
    let mut group_frame = Msg::from_bytes(Bytes::copy_from_slice(group.as_bytes()));
    group_frame.set_flags(MsgFlags::MORE);
    let body = Msg::from_bytes(msg.data_bytes().unwrap_or_else(Bytes::new));
    Ok((group_frame, body))
  }

  /// No partial state to drop; present for symmetry with [`DishSession`].
  pub fn reset(&mut self) {}
}
