// src/socket/patterns/distributor.rs

//! Fan-out of one message to many pipes.
//!
//! The pipe array is split into three nested prefixes:
//! `[0, matching) ⊆ [0, active) ⊆ [0, eligible) ⊆ [0, len)`.
//! Matching pipes receive the message currently being distributed, active
//! pipes are candidates for the next message, and eligible pipes are
//! activated again once the current multipart message is complete (a pipe
//! must never join mid-message). Payloads are reference-counted `Bytes`,
//! so fanning out clones frames without copying data.

use crate::message::Msg;
use crate::pipe::PipeRef;

#[derive(Default)]
pub struct Distributor {
  pipes: Vec<PipeRef>,
  /// Number of pipes receiving the message being distributed now.
  matching: usize,
  /// Number of pipes active for the next message.
  active: usize,
  /// Number of pipes that may become active once the current message ends.
  eligible: usize,
  /// True while in the middle of a multipart message.
  more: bool,
}

impl Distributor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn attach(&mut self, pipe: PipeRef) {
    // A pipe arriving mid-message only becomes eligible; it is activated
    // when the message completes. Otherwise it is active immediately.
    if self.more {
      self.pipes.push(pipe);
      let last = self.pipes.len() - 1;
      self.pipes.swap(self.eligible, last);
      self.eligible += 1;
    } else {
      self.pipes.push(pipe);
      let last = self.pipes.len() - 1;
      self.pipes.swap(self.active, last);
      self.active += 1;
      self.eligible += 1;
    }
  }

  /// Marks the pipe as receiving the message currently being distributed.
  pub fn match_pipe(&mut self, pipe: &PipeRef) {
    let Some(index) = self.index_of(pipe) else {
      return;
    };
    // Already matching, or not eligible at all.
    if index < self.matching || index >= self.eligible {
      return;
    }
    self.pipes.swap(index, self.matching);
    self.matching += 1;
  }

  /// Clears the matching set.
  pub fn unmatch(&mut self) {
    self.matching = 0;
  }

  pub fn activated(&mut self, pipe: &PipeRef) {
    // Move the pipe from passive to eligible.
    let Some(index) = self.index_of(pipe) else {
      return;
    };
    if index < self.eligible {
      return;
    }
    self.pipes.swap(index, self.eligible);
    self.eligible += 1;

    // If no message is being distributed, activate it right away.
    if !self.more {
      self.pipes.swap(self.eligible - 1, self.active);
      self.active += 1;
    }
  }

  pub fn terminated(&mut self, pipe: &PipeRef) {
    let Some(index) = self.index_of(pipe) else {
      return;
    };
    if index < self.matching {
      self.matching -= 1;
    }
    if index < self.active {
      self.active -= 1;
    }
    if index < self.eligible {
      self.eligible -= 1;
    }
    // Shift removal keeps the relative order, so the prefixes stay valid.
    self.pipes.remove(index);
  }

  /// Distributes the frame to every active pipe.
  pub fn send_to_all(&mut self, msg: Msg) {
    self.matching = self.active;
    self.send_to_matching(msg);
  }

  /// Distributes the frame to the matching pipes.
  pub fn send_to_matching(&mut self, msg: Msg) {
    let more = msg.is_more();
    self.distribute(msg);

    // At the end of a message, eligible pipes become active for the next.
    if !more {
      self.active = self.eligible;
    }
    self.more = more;
  }

  fn distribute(&mut self, msg: Msg) {
    if self.matching == 0 {
      return;
    }
    let mut i = 0;
    while i < self.matching {
      let pipe = self.pipes[i].clone();
      if self.write(&pipe, msg.clone()) {
        i += 1;
      }
      // A failed write demoted the pipe; the same slot now holds another.
    }
  }

  /// Writes one frame to one pipe. On failure the pipe is swapped out of
  /// the matching, active and eligible prefixes.
  fn write(&mut self, pipe: &PipeRef, msg: Msg) -> bool {
    let more = msg.is_more();
    if pipe.write(msg).is_err() {
      tracing::debug!("write failed, removing pipe from distribution");
      if let Some(index) = self.index_of(pipe) {
        self.pipes.swap(index, self.matching - 1);
      }
      self.matching -= 1;
      if let Some(index) = self.index_of(pipe) {
        self.pipes.swap(index, self.active - 1);
      }
      self.active -= 1;
      self.pipes.swap(self.active, self.eligible - 1);
      self.eligible -= 1;
      return false;
    }
    if !more {
      pipe.flush();
    }
    true
  }

  pub fn has_out(&self) -> bool {
    // Distribution drops rather than blocks; it can always accept.
    true
  }

  fn index_of(&self, pipe: &PipeRef) -> Option<usize> {
    self.pipes.iter().position(|p| p == pipe)
  }
}
