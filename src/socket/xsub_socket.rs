// src/socket/xsub_socket.rs

//! XSUB: subscriber that exposes subscription traffic. The application
//! sends `[1, topic]` / `[0, topic]` frames itself; the socket keeps its
//! own trie so duplicate subscriptions are forwarded upstream only once
//! and replayed to publishers that (re)connect.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::options::SocketOption;
use crate::socket::patterns::{Distributor, FairQueue, SubscriptionTrie};
use crate::socket::SendError;

pub struct XsubSocket {
  fq: FairQueue,
  distribution: Distributor,
  subscriptions: SubscriptionTrie,
  /// Message read ahead by `has_in`.
  has_message: Option<Msg>,
  /// True while the application is mid-way through reading a message.
  more_in: bool,
  /// True while the application is mid-way through sending a message.
  more_out: bool,
  /// Drop inbound messages that match no subscription. Off for XSUB,
  /// where upstream publishers already filter; SUB turns it on.
  filter: bool,
}

impl XsubSocket {
  pub fn new() -> Self {
    Self::with_filter(false)
  }

  pub(crate) fn with_filter(filter: bool) -> Self {
    Self {
      fq: FairQueue::new(),
      distribution: Distributor::new(),
      subscriptions: SubscriptionTrie::new(),
      has_message: None,
      more_in: false,
      more_out: false,
      filter,
    }
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    match option {
      SocketOption::Filter(value) => self.filter = value,
      other => {
        return Err(ZmqError::InvalidArgument(format!(
          "option not supported by XSUB: {:?}",
          other
        )))
      }
    }
    Ok(())
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    self.fq.attach(pipe.clone());
    self.distribution.attach(pipe.clone());
    self.send_subscriptions(&pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.fq.terminated(pipe);
    self.distribution.terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.fq.activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    self.distribution.activated(pipe);
  }

  /// Replays the whole subscription set to a publisher that reconnected
  /// with an empty outbound queue.
  pub fn hiccuped(&mut self, pipe: &PipeRef) {
    self.send_subscriptions(pipe);
  }

  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    let more = msg.is_more();
    let data = msg.data().unwrap_or(&[]);

    // Only the first frame of a message can be a subscription command.
    if !self.more_out && !data.is_empty() && data[0] == 1 {
      // Send it upstream only when the trie did not know the topic yet.
      if self.subscriptions.add(&data[1..]) {
        self.distribution.send_to_all(msg);
      }
    } else if !self.more_out && !data.is_empty() && data[0] == 0 {
      if self.subscriptions.remove(&data[1..]) {
        self.distribution.send_to_all(msg);
      }
    } else {
      // Pass everything else through to the publishers.
      self.distribution.send_to_all(msg);
    }

    self.more_out = more;
    Ok(())
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    if let Some(msg) = self.has_message.take() {
      self.more_in = msg.is_more();
      return Ok(Some(msg));
    }

    loop {
      let Some(msg) = self.fq.recv() else {
        return Ok(None);
      };

      // Mid-message frames were already accepted by the filter.
      if self.more_in || !self.filter || self.matches(&msg) {
        self.more_in = msg.is_more();
        return Ok(Some(msg));
      }

      // Drop the whole unmatched message.
      let mut more = msg.is_more();
      while more {
        let Some(part) = self.fq.recv() else {
          return Ok(None);
        };
        more = part.is_more();
      }
    }
  }

  pub fn has_in(&mut self) -> bool {
    if self.more_in || self.has_message.is_some() {
      return true;
    }

    loop {
      let Some(msg) = self.fq.recv() else {
        return false;
      };
      if !self.filter || self.matches(&msg) {
        self.has_message = Some(msg);
        return true;
      }
      let mut more = msg.is_more();
      while more {
        let Some(part) = self.fq.recv() else {
          return false;
        };
        more = part.is_more();
      }
    }
  }

  pub fn has_out(&mut self) -> bool {
    // Subscription commands are dropped when no publisher can take them.
    true
  }

  fn matches(&self, msg: &Msg) -> bool {
    self.subscriptions.check(msg.data().unwrap_or(&[]))
  }

  fn send_subscriptions(&mut self, pipe: &PipeRef) {
    let mut dropped = false;
    self.subscriptions.apply(|topic| {
      if dropped {
        return;
      }
      let mut frame = Vec::with_capacity(topic.len() + 1);
      frame.push(1);
      frame.extend_from_slice(topic);
      // The pipe just (re)connected, so its queue should have room; if it
      // does not, stop replaying rather than send a partial topic set.
      if pipe.write(Msg::from_vec(frame)).is_err() {
        dropped = true;
      }
    });
    pipe.flush();
  }
}

impl Default for XsubSocket {
  fn default() -> Self {
    Self::new()
  }
}
