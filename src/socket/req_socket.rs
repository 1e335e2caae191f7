// src/socket/req_socket.rs

//! REQ: strict send/recv alternation on top of DEALER. Prefixes each
//! request with an empty delimiter frame (and optionally a request id),
//! and drops replies that do not belong to the outstanding request.

use crate::error::ZmqError;
use crate::message::{Msg, MsgFlags};
use crate::pipe::PipeRef;
use crate::socket::dealer_socket::DealerSocket;
use crate::socket::options::SocketOption;
use crate::socket::SendError;
use bytes::Bytes;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ReqState {
  /// Ready to start a new request.
  SendRequest,
  /// Mid-way through a multipart request.
  SendingBody,
  /// Request sent; waiting for the reply envelope.
  AwaitingReply,
  /// Reply envelope consumed; handing body frames to the application.
  ReceivingBody,
}

pub struct ReqSocket {
  dealer: DealerSocket,
  state: ReqState,
  /// Id of the outstanding request, sent as an extra envelope frame when
  /// correlation is enabled.
  request_id: u32,
  /// Strict alternation; cleared by the relaxed option.
  strict: bool,
  /// Prefix requests with a request id and verify it on the reply.
  correlate: bool,
  /// Pipe the outstanding request went to. Replies arriving on any other
  /// pipe are stale and get dropped.
  reply_pipe: Option<PipeRef>,
  /// First reply body frame, validated ahead of `recv` by `has_in`.
  prefetched_reply: Option<Msg>,
}

impl ReqSocket {
  pub fn new() -> Self {
    Self {
      dealer: DealerSocket::new(),
      state: ReqState::SendRequest,
      request_id: rand::random(),
      strict: true,
      correlate: false,
      reply_pipe: None,
      prefetched_reply: None,
    }
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    match option {
      SocketOption::ReqCorrelate(value) => self.correlate = value,
      SocketOption::ReqRelaxed(value) => self.strict = !value,
      other => {
        return Err(ZmqError::InvalidArgument(format!(
          "option not supported by REQ: {:?}",
          other
        )))
      }
    }
    Ok(())
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.dealer.pipe_attached(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    if self.reply_pipe.as_ref() == Some(pipe) {
      self.reply_pipe = None;
    }
    self.dealer.pipe_terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.dealer.read_activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.dealer.write_activated(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    if matches!(self.state, ReqState::AwaitingReply | ReqState::ReceivingBody) {
      if self.strict {
        return Err(SendError::Zmq(ZmqError::InvalidState(
          "cannot send another request while awaiting a reply",
        )));
      }
      // Relaxed mode: abandon the outstanding request and start over.
      self.state = ReqState::SendRequest;
      self.reply_pipe = None;
      self.prefetched_reply = None;
    }

    if self.state == ReqState::SendRequest {
      self.reply_pipe = None;

      if self.correlate {
        self.request_id = self.request_id.wrapping_add(1);
        let mut id = Msg::from_bytes(Bytes::copy_from_slice(&self.request_id.to_be_bytes()));
        id.set_flags(MsgFlags::MORE);
        match self.dealer.send_pipe(id) {
          Ok(pipe) => self.reply_pipe = pipe,
          Err(_) => return Err(SendError::Full(msg)),
        }
      }

      let mut bottom = Msg::new();
      bottom.set_flags(MsgFlags::MORE);
      match self.dealer.send_pipe(bottom) {
        Ok(pipe) => {
          if pipe.is_some() {
            self.reply_pipe = pipe;
          }
        }
        Err(_) => return Err(SendError::Full(msg)),
      }

      // Eat replies still sitting in the queues. Without this a slow peer
      // could answer a request from an hour ago and have that answer taken
      // for the reply to the request being sent now.
      while let Some(_stale) = self.dealer.recv_from() {}
    }

    let more = msg.is_more();
    self.dealer.send(msg)?;
    self.state = if more {
      ReqState::SendingBody
    } else {
      ReqState::AwaitingReply
    };
    Ok(())
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    match self.state {
      ReqState::SendRequest | ReqState::SendingBody => Err(ZmqError::InvalidState(
        "cannot receive a reply before sending a request",
      )),
      ReqState::AwaitingReply => {
        let body = match self.prefetched_reply.take() {
          Some(body) => body,
          None => match self.recv_reply_start() {
            Some(body) => body,
            None => return Ok(None),
          },
        };
        if body.is_more() {
          self.state = ReqState::ReceivingBody;
        } else {
          self.state = ReqState::SendRequest;
          self.reply_pipe = None;
        }
        Ok(Some(body))
      }
      ReqState::ReceivingBody => {
        let Some((msg, _)) = self.dealer.recv_from() else {
          return Ok(None);
        };
        if !msg.is_more() {
          self.state = ReqState::SendRequest;
          self.reply_pipe = None;
        }
        Ok(Some(msg))
      }
    }
  }

  pub fn has_in(&mut self) -> bool {
    match self.state {
      ReqState::AwaitingReply => {
        // Run the validation so a buffered stale or malformed reply does
        // not count as readable.
        if self.prefetched_reply.is_none() {
          self.prefetched_reply = self.recv_reply_start();
        }
        self.prefetched_reply.is_some()
      }
      ReqState::ReceivingBody => self.dealer.has_in(),
      ReqState::SendRequest | ReqState::SendingBody => false,
    }
  }

  pub fn has_out(&mut self) -> bool {
    (!self.strict || matches!(self.state, ReqState::SendRequest | ReqState::SendingBody))
      && self.dealer.has_out()
  }

  /// Consumes the reply envelope and returns the first body frame. Replies
  /// from the wrong pipe or with a malformed envelope are dropped whole and
  /// the next one is tried.
  fn recv_reply_start(&mut self) -> Option<Msg> {
    loop {
      let (msg, pipe) = self.dealer.recv_from()?;

      if let Some(reply_pipe) = &self.reply_pipe {
        if &pipe != reply_pipe {
          tracing::debug!("dropping stale reply from a previous request");
          self.drain_message(&msg);
          continue;
        }
      }

      let mut envelope = msg;
      if self.correlate {
        let id_ok = envelope.is_more()
          && envelope.data() == Some(self.request_id.to_be_bytes().as_slice());
        if !id_ok {
          tracing::debug!("dropping reply with a bad request id");
          self.drain_message(&envelope);
          continue;
        }
        let (next, _) = self.dealer.recv_from()?;
        envelope = next;
      }

      // The delimiter between the envelope and the body must be an empty
      // frame with more parts behind it.
      if !(envelope.is_more() && envelope.size() == 0) {
        tracing::debug!("dropping reply with a malformed envelope");
        self.drain_message(&envelope);
        continue;
      }

      let (body, _) = self.dealer.recv_from()?;
      return Some(body);
    }
  }

  /// Discards the remaining frames of the message `first` belongs to.
  fn drain_message(&mut self, first: &Msg) {
    let mut more = first.is_more();
    while more {
      let Some((part, _)) = self.dealer.recv_from() else {
        return;
      };
      more = part.is_more();
    }
  }
}

impl Default for ReqSocket {
  fn default() -> Self {
    Self::new()
  }
}
