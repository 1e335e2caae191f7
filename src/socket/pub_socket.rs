// src/socket/pub_socket.rs

//! PUB: send-only publisher. Subscriptions from peers still steer the
//! fan-out, but the application never sees them.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::options::SocketOption;
use crate::socket::xpub_socket::XpubSocket;
use crate::socket::SendError;

pub struct PubSocket {
  xpub: XpubSocket,
}

impl PubSocket {
  pub fn new() -> Self {
    Self {
      xpub: XpubSocket::with_kind(false),
    }
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    match option {
      SocketOption::XpubWelcomeMessage(_) => self.xpub.set_option(option),
      other => Err(ZmqError::InvalidArgument(format!(
        "option not supported by PUB: {:?}",
        other
      ))),
    }
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.xpub.pipe_attached(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.xpub.pipe_terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.xpub.read_activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.xpub.write_activated(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    self.xpub.send(msg)
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    Err(ZmqError::InvalidSocketType("PUB sockets cannot receive"))
  }

  pub fn has_in(&mut self) -> bool {
    false
  }

  pub fn has_out(&mut self) -> bool {
    self.xpub.has_out()
  }
}

impl Default for PubSocket {
  fn default() -> Self {
    Self::new()
  }
}
