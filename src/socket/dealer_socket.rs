// src/socket/dealer_socket.rs

//! DEALER: asynchronous round-robin request distribution, fair-queued
//! replies. Identity frames arriving after a peer reconnect are dropped.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::{FairQueue, LoadBalancer};
use crate::socket::SendError;

#[derive(Default)]
pub struct DealerSocket {
  fq: FairQueue,
  lb: LoadBalancer,
  /// Message read ahead by `has_in`, with its source pipe.
  prefetched: Option<(Msg, PipeRef)>,
}

impl DealerSocket {
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
    self.lb.send(msg).map_err(SendError::Full)
  }

  /// Sends a frame and reports which pipe took it (REQ correlates replies
  /// with the pipe its request went to).
  pub fn send_pipe(&mut self, msg: Msg) -> Result<Option<PipeRef>, Msg> {
    self.lb.send_pipe(msg)
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    Ok(self.recv_from().map(|(msg, _)| msg))
  }

  /// Receives a frame together with its source pipe.
  pub fn recv_from(&mut self) -> Option<(Msg, PipeRef)> {
    if let Some(prefetched) = self.prefetched.take() {
      return Some(prefetched);
    }
    // DEALER doesn't use identity frames; drop any that show up after a
    // peer reconnects.
    loop {
      let (msg, pipe) = self.fq.recv_from()?;
      if !msg.is_identity() {
        return Some((msg, pipe));
      }
    }
  }

  pub fn has_in(&mut self) -> bool {
    if self.prefetched.is_some() {
      return true;
    }
    match self.recv_from() {
      Some(prefetched) => {
        self.prefetched = Some(prefetched);
        true
      }
      None => false,
    }
  }

  pub fn has_out(&mut self) -> bool {
    self.lb.has_out()
  }
}
