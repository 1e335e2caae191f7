// src/socket/peer_socket.rs

//! PEER: symmetric peer-to-peer messaging. Every message is exactly two
//! frames: a 4-byte little-endian routing id naming the peer, then a
//! single data frame.

use crate::error::ZmqError;
use crate::message::{Msg, MsgFlags};
use crate::pipe::PipeRef;
use crate::socket::patterns::FairQueue;
use crate::socket::SendError;
use bytes::Bytes;
use std::collections::HashMap;

struct Outpipe {
  pipe: PipeRef,
  active: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SendPhase {
  /// Expecting the routing id frame.
  RoutingId,
  /// Routing id consumed; expecting the data frame.
  Data,
}

pub struct PeerSocket {
  fq: FairQueue,
  /// Outbound pipes indexed by peer routing id.
  outpipes: HashMap<u32, Outpipe>,
  /// Next routing id to hand out; increment-and-wrap, never zero.
  next_routing_id: u32,
  send_phase: SendPhase,
  /// Destination of the message currently being written.
  current_out: Option<PipeRef>,
  /// Routing id frame built for a message read ahead of the application.
  prefetched_id: Option<Msg>,
  /// Body frame read ahead of the application.
  prefetched_msg: Option<Msg>,
  /// True when the application has read the id frame but not the body yet.
  more_in: bool,
}

impl PeerSocket {
  pub fn new() -> Self {
    Self {
      fq: FairQueue::new(),
      outpipes: HashMap::new(),
      next_routing_id: rand::random(),
      send_phase: SendPhase::RoutingId,
      current_out: None,
      prefetched_id: None,
      prefetched_msg: None,
      more_in: false,
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
    tracing::trace!(routing_id, "PEER connected");
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.outpipes.remove(&pipe.routing_id());
    self.fq.terminated(pipe);
    if self.current_out.as_ref() == Some(pipe) {
      self.current_out = None;
    }
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
    match self.send_phase {
      SendPhase::RoutingId => {
        let id_ok = msg.is_more() && msg.size() == 4;
        if !id_ok {
          return Err(SendError::Zmq(ZmqError::InvalidMessage(
            "PEER messages start with a 4-byte routing id frame".into(),
          )));
        }
        let mut id_bytes = [0u8; 4];
        id_bytes.copy_from_slice(msg.data().unwrap_or(&[]));
        let routing_id = u32::from_le_bytes(id_bytes);

        let Some(outpipe) = self.outpipes.get_mut(&routing_id) else {
          return Err(SendError::Zmq(ZmqError::HostUnreachable(format!(
            "no peer with routing id {}",
            routing_id
          ))));
        };
        if !outpipe.active || !outpipe.pipe.check_write() {
          outpipe.active = false;
          return Err(SendError::Zmq(ZmqError::HostUnreachable(format!(
            "peer {} is not writable",
            routing_id
          ))));
        }
        self.current_out = Some(outpipe.pipe.clone());
        self.send_phase = SendPhase::Data;
        Ok(())
      }
      SendPhase::Data => {
        if msg.is_more() {
          return Err(SendError::Zmq(ZmqError::InvalidMessage(
            "PEER messages carry a single data frame".into(),
          )));
        }
        msg.clear_flags(MsgFlags::MORE);
        self.send_phase = SendPhase::RoutingId;
        if let Some(pipe) = self.current_out.take() {
          if pipe.write(msg).is_ok() {
            pipe.flush();
          }
        }
        Ok(())
      }
    }
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    if let Some(id) = self.prefetched_id.take() {
      self.more_in = true;
      return Ok(Some(id));
    }
    if let Some(msg) = self.prefetched_msg.take() {
      self.more_in = false;
      return Ok(Some(msg));
    }

    if self.more_in {
      // The id frame was handed out; the body is next on the same pipe.
      let Some((msg, _)) = self.fq.recv_from() else {
        return Ok(None);
      };
      self.more_in = msg.is_more();
      return Ok(Some(msg));
    }

    let Some((msg, pipe)) = self.fq.recv_from() else {
      return Ok(None);
    };
    self.prefetched_msg = Some(msg);
    self.more_in = true;
    Ok(Some(Self::id_frame(pipe.routing_id())))
  }

  pub fn has_in(&mut self) -> bool {
    if self.more_in || self.prefetched_id.is_some() || self.prefetched_msg.is_some() {
      return true;
    }
    let Some((msg, pipe)) = self.fq.recv_from() else {
      return false;
    };
    self.prefetched_id = Some(Self::id_frame(pipe.routing_id()));
    self.prefetched_msg = Some(msg);
    true
  }

  pub fn has_out(&mut self) -> bool {
    // Whether a write succeeds depends on the routing id of the message.
    true
  }

  fn id_frame(routing_id: u32) -> Msg {
    let mut id = Msg::from_bytes(Bytes::copy_from_slice(&routing_id.to_le_bytes()));
    id.set_flags(MsgFlags::MORE);
    id
  }
}

impl Default for PeerSocket {
  fn default() -> Self {
    Self::new()
  }
}
