// src/socket/patterns/load_balancer.rs

//! Round-robin demultiplexer for outbound pipes.
//!
//! Mirror image of the fair queue: writable pipes occupy the active prefix,
//! a cursor picks the pipe for the next message, and the cursor only
//! advances after the final part of a multipart message. If the pipe
//! carrying a partially written message terminates, the balancer enters
//! dropping mode and silently discards the rest of that message rather
//! than splicing its tail onto another peer's stream.

use crate::message::Msg;
use crate::pipe::PipeRef;

#[derive(Default)]
pub struct LoadBalancer {
  /// Outbound pipes. The first `active` entries are writable.
  pipes: Vec<PipeRef>,
  active: usize,
  /// Index of the pipe receiving the current message.
  current: usize,
  /// True while in the middle of writing a multipart message.
  more: bool,
  /// True while discarding the tail of a message whose pipe went away.
  dropping: bool,
}

impl LoadBalancer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn attach(&mut self, pipe: PipeRef) {
    self.pipes.push(pipe.clone());
    self.activated(&pipe);
  }

  pub fn activated(&mut self, pipe: &PipeRef) {
    if let Some(index) = self.pipes.iter().position(|p| p == pipe) {
      // Already active; nothing to move.
      if index < self.active {
        return;
      }
      self.pipes.swap(index, self.active);
      self.active += 1;
    }
  }

  pub fn terminated(&mut self, pipe: &PipeRef) {
    let Some(index) = self.pipes.iter().position(|p| p == pipe) else {
      return;
    };

    // If the pipe carried a partially sent message, drop the rest of it.
    if index == self.current && self.more {
      self.dropping = true;
      tracing::debug!("pipe terminated mid-message, dropping remaining parts");
    }

    if index < self.active {
      self.active -= 1;
      self.pipes.swap(index, self.active);
      if self.current == self.active {
        self.current = 0;
      }
    }
    if let Some(index) = self.pipes.iter().position(|p| p == pipe) {
      self.pipes.remove(index);
    }
  }

  /// Sends one frame to the pipe under the cursor. `Err` returns the frame
  /// when no active pipe can accept it.
  pub fn send(&mut self, msg: Msg) -> Result<(), Msg> {
    self.send_pipe(msg).map(|_| ())
  }

  /// Like [`send`](Self::send), also reporting which pipe took the frame
  /// (`None` when the frame was consumed by dropping mode).
  pub fn send_pipe(&mut self, mut msg: Msg) -> Result<Option<PipeRef>, Msg> {
    // Drop the remaining parts of a message whose pipe terminated.
    if self.dropping {
      self.more = msg.is_more();
      self.dropping = self.more;
      return Ok(None);
    }

    while self.active > 0 {
      let more = msg.is_more();
      let pipe = self.pipes[self.current].clone();
      match pipe.write(msg) {
        Ok(()) => {
          self.more = more;
          if !more {
            pipe.flush();
            self.current = (self.current + 1) % self.active;
          }
          return Ok(Some(pipe));
        }
        Err(returned) => {
          msg = returned;
          // A pipe that accepted the first part accepts the rest.
          debug_assert!(!self.more);
          self.active -= 1;
          if self.current < self.active {
            self.pipes.swap(self.current, self.active);
          } else {
            self.current = 0;
          }
        }
      }
    }
    Err(msg)
  }

  pub fn has_out(&mut self) -> bool {
    // Remaining parts of a partially sent message are always accepted.
    if self.more {
      return true;
    }
    while self.active > 0 {
      if self.pipes[self.current].check_write() {
        return true;
      }
      self.active -= 1;
      if self.current < self.active {
        self.pipes.swap(self.current, self.active);
      } else {
        self.current = 0;
      }
    }
    false
  }
}
