// src/socket/radio_socket.rs

//! RADIO: group-based publisher. Peers announce group membership with
//! join/leave control messages; a published message goes to every peer
//! that joined its group.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::Distributor;
use crate::socket::SendError;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct RadioSocket {
  /// Peers that joined each group.
  subscriptions: HashMap<String, HashSet<PipeRef>>,
  distribution: Distributor,
}

impl RadioSocket {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    pipe.set_nodelay();
    self.distribution.attach(pipe.clone());
    // The pipe may already carry join messages.
    self.read_activated(&pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.subscriptions.retain(|_, pipes| {
      pipes.remove(pipe);
      !pipes.is_empty()
    });
    self.distribution.terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    // Only group control messages are expected from DISH peers; data
    // frames are discarded.
    while let Some(msg) = pipe.read() {
      let Some(group) = msg.group() else {
        continue;
      };
      if msg.is_join() {
        self
          .subscriptions
          .entry(group.to_owned())
          .or_default()
          .insert(pipe.clone());
      } else if msg.is_leave() {
        if let Some(pipes) = self.subscriptions.get_mut(group) {
          pipes.remove(pipe);
          if pipes.is_empty() {
            self.subscriptions.remove(group);
          }
        }
      }
    }
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.distribution.activated(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    if msg.is_more() {
      return Err(SendError::Zmq(ZmqError::InvalidMessage(
        "RADIO sockets do not allow multipart data".into(),
      )));
    }

    self.distribution.unmatch();
    if let Some(pipes) = self.subscriptions.get(msg.group().unwrap_or("")) {
      for pipe in pipes {
        self.distribution.match_pipe(pipe);
      }
    }
    self.distribution.send_to_matching(msg);
    Ok(())
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    Err(ZmqError::InvalidSocketType("RADIO sockets cannot receive"))
  }

  pub fn has_in(&mut self) -> bool {
    false
  }

  pub fn has_out(&mut self) -> bool {
    self.distribution.has_out()
  }
}
