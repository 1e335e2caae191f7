// src/socket/pull_socket.rs

//! PULL: fair-queue inbound messages from connected peers.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::FairQueue;
use crate::socket::SendError;

#[derive(Default)]
pub struct PullSocket {
  fq: FairQueue,
}

impl PullSocket {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.fq.attach(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.fq.terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.fq.activated(pipe);
  }

  pub fn write_activated(&mut self, _pipe: &PipeRef) {}

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    let _ = msg;
    Err(SendError::Zmq(ZmqError::InvalidSocketType(
      "PULL sockets cannot send",
    )))
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    Ok(self.fq.recv())
  }

  pub fn has_in(&mut self) -> bool {
    self.fq.has_in()
  }

  pub fn has_out(&mut self) -> bool {
    false
  }
}
