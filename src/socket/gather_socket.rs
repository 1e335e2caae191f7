// src/socket/gather_socket.rs

//! GATHER: thread-safe cousin of PULL; single-part messages only.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::FairQueue;
use crate::socket::SendError;

#[derive(Default)]
pub struct GatherSocket {
  fq: FairQueue,
}

impl GatherSocket {
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
      "GATHER sockets cannot send",
    )))
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    let Some(mut msg) = self.fq.recv() else {
      return Ok(None);
    };

    // Drop multipart messages from misbehaving peers, one logical message
    // at a time, until a single-part message arrives.
    while msg.is_more() {
      tracing::debug!("dropping multipart message on GATHER socket");
      // Drain the rest of the offending message.
      loop {
        let Some(part) = self.fq.recv() else {
          return Ok(None);
        };
        if !part.is_more() {
          break;
        }
      }
      let Some(next) = self.fq.recv() else {
        return Ok(None);
      };
      msg = next;
    }
    Ok(Some(msg))
  }

  pub fn has_in(&mut self) -> bool {
    self.fq.has_in()
  }

  pub fn has_out(&mut self) -> bool {
    false
  }
}
