// src/socket/dish_socket.rs

//! DISH: group-based subscriber. The application joins and leaves groups
//! explicitly; membership changes are sent to every RADIO peer, and
//! inbound messages are filtered against the joined set as a safety net.

use crate::error::ZmqError;
use crate::message::{Msg, MAX_GROUP_LENGTH};
use crate::pipe::PipeRef;
use crate::socket::patterns::{Distributor, FairQueue};
use crate::socket::SendError;
use std::collections::HashSet;

#[derive(Default)]
pub struct DishSocket {
  fq: FairQueue,
  distribution: Distributor,
  /// Groups this socket is a member of.
  subscriptions: HashSet<String>,
  /// Message read ahead by `has_in`.
  has_message: Option<Msg>,
}

impl DishSocket {
  pub fn new() -> Self {
    Self::default()
  }

  /// Joins a group. Membership is exact-match; joining twice is an error.
  pub fn join(&mut self, group: &str) -> Result<(), ZmqError> {
    if group.len() > MAX_GROUP_LENGTH {
      return Err(ZmqError::InvalidArgument(format!(
        "group name exceeds {} bytes",
        MAX_GROUP_LENGTH
      )));
    }
    if !self.subscriptions.insert(group.to_owned()) {
      return Err(ZmqError::InvalidArgument(format!(
        "already a member of group '{}'",
        group
      )));
    }
    let msg = Msg::new_join(group)?;
    self.distribution.send_to_all(msg);
    Ok(())
  }

  /// Leaves a group previously joined.
  pub fn leave(&mut self, group: &str) -> Result<(), ZmqError> {
    if !self.subscriptions.remove(group) {
      return Err(ZmqError::InvalidArgument(format!(
        "not a member of group '{}'",
        group
      )));
    }
    let msg = Msg::new_leave(group)?;
    self.distribution.send_to_all(msg);
    Ok(())
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.fq.attach(pipe.clone());
    self.distribution.attach(pipe.clone());
    self.send_subscriptions(&pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.fq.terminated(pipe);
    self.distribution.terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.fq.activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.distribution.activated(pipe);
  }

  /// Replays the membership set to a RADIO peer that reconnected with an
  /// empty outbound queue.
  pub fn hiccuped(&mut self, pipe: &PipeRef) {
    self.send_subscriptions(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    let _ = msg;
    Err(SendError::Zmq(ZmqError::InvalidSocketType(
      "DISH sockets cannot send",
    )))
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    if let Some(msg) = self.has_message.take() {
      return Ok(Some(msg));
    }
    Ok(self.recv_filtered())
  }

  pub fn has_in(&mut self) -> bool {
    if self.has_message.is_some() {
      return true;
    }
    match self.recv_filtered() {
      Some(msg) => {
        self.has_message = Some(msg);
        true
      }
      None => false,
    }
  }

  pub fn has_out(&mut self) -> bool {
    false
  }

  fn recv_filtered(&mut self) -> Option<Msg> {
    // A well-behaved RADIO only sends matching groups; filter anyway in
    // case a leave crossed paths with a message in flight.
    loop {
      let msg = self.fq.recv()?;
      if self.subscriptions.contains(msg.group().unwrap_or("")) {
        return Some(msg);
      }
      tracing::debug!(group = ?msg.group(), "dropping message for a group not joined");
    }
  }

  fn send_subscriptions(&mut self, pipe: &PipeRef) {
    for group in &self.subscriptions {
      // Group names were validated on join; building the message cannot
      // fail here.
      if let Ok(msg) = Msg::new_join(group) {
        if pipe.write(msg).is_err() {
          break;
        }
      }
    }
    pipe.flush();
  }
}
