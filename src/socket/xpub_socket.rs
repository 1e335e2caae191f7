// src/socket/xpub_socket.rs

//! XPUB: publisher that surfaces subscription traffic. Subscribers send
//! `[1, topic]` to subscribe and `[0, topic]` to unsubscribe; those frames
//! are applied to the subscription trie and (depending on options) handed
//! to the application via `recv`.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::options::SocketOption;
use crate::socket::patterns::{Distributor, MultiTrie};
use crate::socket::SendError;
use bytes::Bytes;
use std::collections::VecDeque;

pub struct XpubSocket {
  subscriptions: MultiTrie,
  distribution: Distributor,
  /// Surface duplicate (un)subscriptions instead of only unique ones.
  verbose: bool,
  /// Subscription frames are not applied automatically; the application
  /// reads them and subscribes pipes itself via socket options.
  manual: bool,
  /// Recognise `[2, topic]` broadcast frames from subscribers.
  broadcast_enabled: bool,
  /// Pipe the most recently received subscription or broadcast came from.
  last_pipe: Option<PipeRef>,
  last_pipe_is_broadcast: bool,
  /// Sent to every subscriber on attach.
  welcome_message: Option<Bytes>,
  /// True while in the middle of a multipart outbound message.
  more_out: bool,
  /// True while the next frame read from a subscriber continues a
  /// multipart message.
  more_from_peer: bool,
  /// True while the application is mid-way through reading from `pending`.
  more_in: bool,
  /// Subscription and broadcast frames waiting for the application, with
  /// the pipe they came from when it matters.
  pending: VecDeque<(Msg, Option<PipeRef>)>,
  /// False for plain PUB, which applies subscriptions but never surfaces
  /// them to the application.
  is_xpub: bool,
}

impl XpubSocket {
  pub fn new() -> Self {
    Self::with_kind(true)
  }

  pub(crate) fn with_kind(is_xpub: bool) -> Self {
    Self {
      subscriptions: MultiTrie::new(),
      distribution: Distributor::new(),
      verbose: false,
      manual: false,
      broadcast_enabled: false,
      last_pipe: None,
      last_pipe_is_broadcast: false,
      welcome_message: None,
      more_out: false,
      more_from_peer: false,
      more_in: false,
      pending: VecDeque::new(),
      is_xpub,
    }
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    match option {
      SocketOption::XpubVerbose(value) => self.verbose = value,
      SocketOption::XpubManual(value) => self.manual = value,
      SocketOption::XpubBroadcast(value) => self.broadcast_enabled = value,
      SocketOption::XpubWelcomeMessage(data) => {
        self.welcome_message = data.map(Bytes::from);
      }
      SocketOption::Subscribe(topic) => {
        // Manual mode: the application subscribes the pipe whose
        // subscription frame it just read.
        if !self.manual {
          return Err(ZmqError::InvalidState(
            "subscribing via options requires manual mode",
          ));
        }
        if let Some(pipe) = self.last_pipe.clone() {
          self.subscriptions.add(&topic, &pipe);
        }
      }
      SocketOption::Identity(identity) => {
        if !self.manual {
          return Err(ZmqError::InvalidState(
            "reassigning a peer identity requires manual mode",
          ));
        }
        if let Some(pipe) = &self.last_pipe {
          pipe.set_identity(identity);
        }
      }
      SocketOption::Unsubscribe(topic) => {
        if !self.manual {
          return Err(ZmqError::InvalidState(
            "unsubscribing via options requires manual mode",
          ));
        }
        if let Some(pipe) = self.last_pipe.clone() {
          self.subscriptions.remove(&topic, &pipe);
        }
      }
      other => {
        return Err(ZmqError::InvalidArgument(format!(
          "option not supported by XPUB: {:?}",
          other
        )))
      }
    }
    Ok(())
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.pipe_attached_full(pipe, false);
  }

  /// `subscribe_to_all` pre-subscribes the pipe to everything; used when
  /// the peer is another publisher proxying the whole stream.
  pub fn pipe_attached_full(&mut self, pipe: PipeRef, subscribe_to_all: bool) {
    self.distribution.attach(pipe.clone());
    if subscribe_to_all {
      self.subscriptions.add(&[], &pipe);
    }
    if let Some(welcome) = &self.welcome_message {
      let msg = Msg::from_bytes(welcome.clone());
      if pipe.write(msg).is_ok() {
        pipe.flush();
      }
    }
    // The pipe may already carry subscriptions.
    self.read_activated(&pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    if self.is_xpub {
      // Losing the subscriber generates the matching unsubscriptions.
      let pending = &mut self.pending;
      self.subscriptions.remove_pipe(pipe, |topic| {
        let mut frame = Vec::with_capacity(topic.len() + 1);
        frame.push(0);
        frame.extend_from_slice(topic);
        pending.push_back((Msg::from_vec(frame), None));
      });
    } else {
      self.subscriptions.remove_pipe(pipe, |_topic| {});
    }
    self.distribution.terminated(pipe);
    if self.last_pipe.as_ref() == Some(pipe) {
      self.last_pipe = None;
      self.last_pipe_is_broadcast = false;
    }
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    while let Some(msg) = pipe.read() {
      let first = !self.more_from_peer;
      self.more_from_peer = msg.is_more();

      // Only a complete first frame can carry a command; continuation
      // frames and multipart openers pass through untouched.
      if !first || msg.is_more() {
        if self.is_xpub {
          self.pending.push_back((msg, None));
        }
        continue;
      }

      let data = msg.data().unwrap_or(&[]);
      let is_subscription = !data.is_empty() && (data[0] == 0 || data[0] == 1);

      if is_subscription {
        if self.manual {
          self.pending.push_back((msg, Some(pipe.clone())));
          continue;
        }
        let topic = &data[1..];
        let unique = if data[0] == 1 {
          self.subscriptions.add(topic, pipe)
        } else {
          self.subscriptions.remove(topic, pipe)
        };
        // Duplicates are only surfaced in verbose mode; plain PUB
        // surfaces nothing at all.
        if self.is_xpub && (unique || self.verbose) {
          self.pending.push_back((msg, None));
        }
      } else if self.broadcast_enabled && !data.is_empty() && data[0] == 2 {
        self.pending.push_back((msg, Some(pipe.clone())));
      } else if self.is_xpub {
        // Anything else from a subscriber is handed through untouched.
        self.pending.push_back((msg, None));
      }
    }
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.distribution.activated(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    let more = msg.is_more();

    // The first frame of a message selects the matching subscribers.
    if !self.more_out {
      let dist = &mut self.distribution;
      let skip = if self.last_pipe_is_broadcast {
        // A broadcast is relayed to everyone except its sender.
        self.last_pipe.as_ref()
      } else {
        None
      };
      let data = msg.data().unwrap_or(&[]);
      self.subscriptions.match_pipes(data, |pipe| {
        if Some(pipe) != skip {
          dist.match_pipe(pipe);
        }
      });
    }

    self.distribution.send_to_matching(msg);
    self.more_out = more;
    if !more {
      self.distribution.unmatch();
      // A relayed broadcast is done with its source pipe; a manual-mode
      // subscription pipe stays around until the next one replaces it.
      if self.last_pipe_is_broadcast {
        self.last_pipe = None;
        self.last_pipe_is_broadcast = false;
      }
    }
    Ok(())
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    let Some((msg, pipe)) = self.pending.pop_front() else {
      return Ok(None);
    };
    // Remember the source pipe at message start so manual subscriptions
    // and broadcast relays know whom they concern.
    if !self.more_in {
      if let Some(pipe) = pipe {
        let data = msg.data().unwrap_or(&[]);
        self.last_pipe_is_broadcast = !data.is_empty() && data[0] == 2;
        self.last_pipe = Some(pipe);
      }
    }
    self.more_in = msg.is_more();
    Ok(Some(msg))
  }

  pub fn has_in(&mut self) -> bool {
    !self.pending.is_empty()
  }

  pub fn has_out(&mut self) -> bool {
    self.distribution.has_out()
  }
}

impl Default for XpubSocket {
  fn default() -> Self {
    Self::new()
  }
}
