// src/socket/pair_socket.rs

//! PAIR: an exclusive one-to-one link.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::SendError;

#[derive(Default)]
pub struct PairSocket {
  pipe: Option<PipeRef>,
}

impl PairSocket {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    // PAIR accepts only one peer; any further pipe is shut down.
    if self.pipe.is_some() {
      tracing::debug!("PAIR socket already has a peer, rejecting pipe");
      pipe.terminate(false);
    } else {
      self.pipe = Some(pipe);
    }
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    if self.pipe.as_ref() == Some(pipe) {
      self.pipe = None;
    }
  }

  pub fn read_activated(&mut self, _pipe: &PipeRef) {}

  pub fn write_activated(&mut self, _pipe: &PipeRef) {}

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    let Some(pipe) = self.pipe.as_ref() else {
      return Err(SendError::Full(msg));
    };
    let more = msg.is_more();
    match pipe.write(msg) {
      Ok(()) => {
        if !more {
          pipe.flush();
        }
        Ok(())
      }
      Err(returned) => Err(SendError::Full(returned)),
    }
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    Ok(self.pipe.as_ref().and_then(|p| p.read()))
  }

  pub fn has_in(&mut self) -> bool {
    self.pipe.as_ref().is_some_and(|p| p.check_read())
  }

  pub fn has_out(&mut self) -> bool {
    self.pipe.as_ref().is_some_and(|p| p.check_write())
  }
}
