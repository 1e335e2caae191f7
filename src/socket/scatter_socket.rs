// src/socket/scatter_socket.rs

//! SCATTER: thread-safe cousin of PUSH; single-part messages only.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::LoadBalancer;
use crate::socket::SendError;

#[derive(Default)]
pub struct ScatterSocket {
  lb: LoadBalancer,
}

impl ScatterSocket {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    pipe.set_nodelay();
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
    // SCATTER sockets do not allow multipart data.
    if msg.is_more() {
      return Err(SendError::Zmq(ZmqError::InvalidMessage(
        "SCATTER sockets do not allow multipart data".into(),
      )));
    }
    self.lb.send(msg).map_err(SendError::Full)
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    Err(ZmqError::InvalidSocketType("SCATTER sockets cannot receive"))
  }

  pub fn has_in(&mut self) -> bool {
    false
  }

  pub fn has_out(&mut self) -> bool {
    self.lb.has_out()
  }
}
