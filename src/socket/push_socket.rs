// src/socket/push_socket.rs

//! PUSH: load-balance outbound messages over connected peers.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::LoadBalancer;
use crate::socket::SendError;

#[derive(Default)]
pub struct PushSocket {
  lb: LoadBalancer,
}

impl PushSocket {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.lb.attach(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.lb.terminated(pipe);
  }

  pub fn read_activated(&mut self, _pipe: &PipeRef) {}

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.lb.activated(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    self.lb.send(msg).map_err(SendError::Full)
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    Err(ZmqError::InvalidSocketType("PUSH sockets cannot receive"))
  }

  pub fn has_in(&mut self) -> bool {
    false
  }

  pub fn has_out(&mut self) -> bool {
    self.lb.has_out()
  }
}
