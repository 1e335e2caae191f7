// src/socket/sub_socket.rs

//! SUB: receive-only subscriber. Subscriptions are set through options and
//! translated into the `[1, topic]` / `[0, topic]` frames XSUB speaks;
//! inbound messages are filtered against them locally.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::options::SocketOption;
use crate::socket::xsub_socket::XsubSocket;
use crate::socket::SendError;

pub struct SubSocket {
  xsub: XsubSocket,
}

impl SubSocket {
  pub fn new() -> Self {
    Self {
      // Publishers upstream may not filter; SUB always filters locally.
      xsub: XsubSocket::with_filter(true),
    }
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    let frame = match option {
      SocketOption::Subscribe(topic) => Self::subscription_frame(1, &topic),
      SocketOption::Unsubscribe(topic) => Self::subscription_frame(0, &topic),
      other => {
        return Err(ZmqError::InvalidArgument(format!(
          "option not supported by SUB: {:?}",
          other
        )))
      }
    };
    match self.xsub.send(frame) {
      Ok(()) => Ok(()),
      Err(SendError::Zmq(err)) => Err(err),
      Err(SendError::Full(_)) => Err(ZmqError::ResourceLimitReached),
    }
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.xsub.pipe_attached(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.xsub.pipe_terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.xsub.read_activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.xsub.write_activated(pipe);
  }

  pub fn hiccuped(&mut self, pipe: &PipeRef) {
    self.xsub.hiccuped(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    let _ = msg;
    Err(SendError::Zmq(ZmqError::InvalidSocketType(
      "SUB sockets cannot send",
    )))
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    self.xsub.recv()
  }

  pub fn has_in(&mut self) -> bool {
    self.xsub.has_in()
  }

  pub fn has_out(&mut self) -> bool {
    false
  }

  fn subscription_frame(command: u8, topic: &[u8]) -> Msg {
    let mut frame = Vec::with_capacity(topic.len() + 1);
    frame.push(command);
    frame.extend_from_slice(topic);
    Msg::from_vec(frame)
  }
}

impl Default for SubSocket {
  fn default() -> Self {
    Self::new()
  }
}
