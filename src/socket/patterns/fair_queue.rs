// src/socket/patterns/fair_queue.rs

//! Round-robin multiplexer for inbound pipes.
//!
//! Pipes with data ready sit in the active prefix of the pipe array;
//! deactivated pipes are swapped out to the boundary. A cursor rotates
//! through the active prefix, and a `more` latch pins the cursor to the
//! current pipe until the last part of a multipart message has been read,
//! so logical messages are never interleaved.

use crate::message::Msg;
use crate::pipe::PipeRef;

#[derive(Default)]
pub struct FairQueue {
  /// Inbound pipes. The first `active` entries have messages to read.
  pipes: Vec<PipeRef>,
  /// Number of pipes with messages available.
  active: usize,
  /// Index of the next pipe to read from.
  current: usize,
  /// True if the last read frame had MORE set; the cursor stays put.
  more: bool,
}

impl FairQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn attach(&mut self, pipe: PipeRef) {
    self.pipes.push(pipe);
    let last = self.pipes.len() - 1;
    self.pipes.swap(self.active, last);
    self.active += 1;
  }

  pub fn activated(&mut self, pipe: &PipeRef) {
    if let Some(index) = self.index_of(pipe) {
      // Already active; nothing to move.
      if index < self.active {
        return;
      }
      self.pipes.swap(index, self.active);
      self.active += 1;
    }
  }

  pub fn terminated(&mut self, pipe: &PipeRef) {
    let Some(index) = self.index_of(pipe) else {
      return;
    };
    if index < self.active {
      self.active -= 1;
      self.pipes.swap(index, self.active);
      if self.current == self.active {
        self.current = 0;
      }
    }
    if let Some(index) = self.index_of(pipe) {
      self.pipes.remove(index);
    }
  }

  /// Reads the next frame using the fair-queueing algorithm.
  pub fn recv(&mut self) -> Option<Msg> {
    self.recv_from().map(|(msg, _)| msg)
  }

  /// Reads the next frame, also returning the pipe it came from.
  pub fn recv_from(&mut self) -> Option<(Msg, PipeRef)> {
    // Round-robin over the pipes until one delivers a frame.
    while self.active > 0 {
      let pipe = self.pipes[self.current].clone();
      if let Some(msg) = pipe.read() {
        self.more = msg.is_more();
        // Stick with the same pipe until the whole message is read.
        if !self.more {
          self.current = (self.current + 1) % self.active;
        }
        return Some((msg, pipe));
      }

      // A pipe with a partially read message must deliver the rest.
      debug_assert!(!self.more);

      // Deactivate the pipe; swap it to the boundary of the active prefix.
      self.active -= 1;
      self.pipes.swap(self.current, self.active);
      if self.current == self.active {
        self.current = 0;
      }
    }
    None
  }

  pub fn has_in(&mut self) -> bool {
    // The remaining parts of a partially read message are, by the pipe
    // contract, already available.
    if self.more {
      return true;
    }
    while self.active > 0 {
      if self.pipes[self.current].check_read() {
        return true;
      }
      // The pipe signalled readable earlier but has nothing now.
      self.active -= 1;
      self.pipes.swap(self.current, self.active);
      if self.current == self.active {
        self.current = 0;
      }
    }
    false
  }

  fn index_of(&self, pipe: &PipeRef) -> Option<usize> {
    self.pipes.iter().position(|p| p == pipe)
  }
}
