// src/socket/rep_socket.rs

//! REP: strict recv/send alternation on top of ROUTER. The address
//! envelope of each request (identity frames up to and including the empty
//! delimiter) is saved by echoing it into the reply pipe, so the reply
//! finds its way back without the application ever seeing it.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::options::SocketOption;
use crate::socket::router_socket::RouterSocket;
use crate::socket::SendError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RepState {
  /// Ready for the next request.
  AwaitingRequest,
  /// Envelope consumed; handing body frames to the application.
  ReceivingBody,
  /// Request fully read; waiting for the application to reply.
  SendReply,
  /// Mid-way through a multipart reply.
  SendingBody,
}

pub struct RepSocket {
  router: RouterSocket,
  state: RepState,
}

impl RepSocket {
  pub fn new() -> Self {
    Self {
      router: RouterSocket::new(),
      state: RepState::AwaitingRequest,
    }
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    self.router.set_option(option)
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.router.pipe_attached(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.router.pipe_terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.router.read_activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.router.write_activated(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    if !matches!(self.state, RepState::SendReply | RepState::SendingBody) {
      return Err(SendError::Zmq(ZmqError::InvalidState(
        "cannot send a reply before receiving a request",
      )));
    }

    let more = msg.is_more();
    self.router.send(msg)?;
    self.state = if more {
      RepState::SendingBody
    } else {
      RepState::AwaitingRequest
    };
    Ok(())
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    match self.state {
      RepState::SendReply | RepState::SendingBody => Err(ZmqError::InvalidState(
        "cannot receive another request before sending the reply",
      )),
      RepState::AwaitingRequest => self.recv_request_start(),
      RepState::ReceivingBody => {
        let Some(msg) = self.router.recv()? else {
          return Ok(None);
        };
        if !msg.is_more() {
          self.state = RepState::SendReply;
        }
        Ok(Some(msg))
      }
    }
  }

  pub fn has_in(&mut self) -> bool {
    matches!(self.state, RepState::AwaitingRequest | RepState::ReceivingBody) && self.router.has_in()
  }

  pub fn has_out(&mut self) -> bool {
    matches!(self.state, RepState::SendReply | RepState::SendingBody) && self.router.has_out()
  }

  /// Copies the address envelope into the reply pipe and returns the first
  /// body frame.
  fn recv_request_start(&mut self) -> Result<Option<Msg>, ZmqError> {
    loop {
      let Some(msg) = self.router.recv()? else {
        return Ok(None);
      };

      if msg.is_more() {
        let bottom = msg.size() == 0;
        // Stage the envelope frame on the reply pipe. A failed write means
        // the peer went away mid-request; abandon what was staged.
        if self.router.send(msg).is_err() {
          self.router.rollback();
        }
        if bottom {
          break;
        }
      } else {
        // A request with no delimiter frame is malformed; drop it along
        // with whatever envelope was staged so far.
        tracing::debug!("dropping request with a malformed envelope");
        self.router.rollback();
      }
    }

    let Some(body) = self.router.recv()? else {
      return Ok(None);
    };
    self.state = if body.is_more() {
      RepState::ReceivingBody
    } else {
      RepState::SendReply
    };
    Ok(Some(body))
  }
}

impl Default for RepSocket {
  fn default() -> Self {
    Self::new()
  }
}
