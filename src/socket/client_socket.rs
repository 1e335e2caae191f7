// src/socket/client_socket.rs

//! CLIENT: thread-safe request side of CLIENT/SERVER; single-part messages,
//! load-balanced out, fair-queued in.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::{FairQueue, LoadBalancer};
use crate::socket::SendError;

#[derive(Default)]
pub struct ClientSocket {
  fq: FairQueue,
  lb: LoadBalancer,
}

impl ClientSocket {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.fq.attach(pipe.clone());
    self.lb.attach(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.fq.terminated(pipe);
    self.lb.terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.fq.activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.lb.activated(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    // CLIENT sockets do not allow multipart data.
    if msg.is_more() {
      return Err(SendError::Zmq(ZmqError::InvalidMessage(
        "CLIENT sockets do not allow multipart data".into(),
      )));
    }
    self.lb.send(msg).map_err(SendError::Full)
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    let Some(mut msg) = self.fq.recv() else {
      return Ok(None);
    };

    // Drop multipart messages from misbehaving peers.
    while msg.is_more() {
      tracing::debug!("dropping multipart message on CLIENT socket");
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
    self.lb.has_out()
  }
}
