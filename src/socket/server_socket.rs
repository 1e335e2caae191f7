// src/socket/server_socket.rs

//! SERVER: thread-safe reply side of CLIENT/SERVER. Inbound messages are
//! tagged with a per-peer routing id; outbound messages are routed by it.

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use crate::socket::patterns::FairQueue;
use crate::socket::SendError;
use std::collections::HashMap;

struct Outpipe {
  pipe: PipeRef,
  active: bool,
}

pub struct ServerSocket {
  fq: FairQueue,
  /// Outbound pipes indexed by peer routing id.
  outpipes: HashMap<u32, Outpipe>,
  /// Next routing id to hand out; simple increment-and-wrap, never zero.
  next_routing_id: u32,
}

impl ServerSocket {
  pub fn new() -> Self {
    Self {
      fq: FairQueue::new(),
      outpipes: HashMap::new(),
      next_routing_id: rand::random(),
    }
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    let mut routing_id = self.next_routing_id.wrapping_add(1);
    if routing_id == 0 {
      routing_id = 1; // Never use routing id zero.
    }
    self.next_routing_id = routing_id;

    pipe.set_routing_id(routing_id);
    self.outpipes.insert(
      routing_id,
      Outpipe {
        pipe: pipe.clone(),
        active: true,
      },
    );
    self.fq.attach(pipe);
    tracing::trace!(routing_id, "SERVER peer attached");
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.outpipes.remove(&pipe.routing_id());
    self.fq.terminated(pipe);
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.fq.activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    if let Some(outpipe) = self.outpipes.get_mut(&pipe.routing_id()) {
      outpipe.active = true;
    }
  }

  pub fn send(&mut self, mut msg: Msg) -> Result<(), SendError> {
    // SERVER sockets do not allow multipart data.
    if msg.is_more() {
      return Err(SendError::Zmq(ZmqError::InvalidMessage(
        "SERVER sockets do not allow multipart data".into(),
      )));
    }

    let routing_id = msg.routing_id();
    let Some(outpipe) = self.outpipes.get_mut(&routing_id) else {
      return Err(SendError::Zmq(ZmqError::HostUnreachable(format!(
        "no peer with routing id {}",
        routing_id
      ))));
    };

    if !outpipe.active || !outpipe.pipe.check_write() {
      outpipe.active = false;
      return Err(SendError::Full(msg));
    }

    msg.reset_routing_id();
    let pipe = outpipe.pipe.clone();
    match pipe.write(msg) {
      Ok(()) => {
        pipe.flush();
        Ok(())
      }
      Err(returned) => {
        if let Some(outpipe) = self.outpipes.get_mut(&routing_id) {
          outpipe.active = false;
        }
        Err(SendError::Full(returned))
      }
    }
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    let Some(mut current) = self.fq.recv_from() else {
      return Ok(None);
    };

    // Drop multipart messages from misbehaving peers.
    while current.0.is_more() {
      tracing::debug!("dropping multipart message on SERVER socket");
      loop {
        let Some((part, _)) = self.fq.recv_from() else {
          return Ok(None);
        };
        if !part.is_more() {
          break;
        }
      }
      let Some(next) = self.fq.recv_from() else {
        return Ok(None);
      };
      current = next;
    }

    let (mut msg, pipe) = current;
    msg.set_routing_id(pipe.routing_id());
    Ok(Some(msg))
  }

  pub fn has_in(&mut self) -> bool {
    self.fq.has_in()
  }

  pub fn has_out(&mut self) -> bool {
    // Whether a write succeeds depends on the routing id of the message.
    true
  }
}

impl Default for ServerSocket {
  fn default() -> Self {
    Self::new()
  }
}
