// src/socket/stream_socket.rs

//! STREAM: raw connection access. Every inbound chunk is delivered as an
//! identity frame naming the connection followed by one data frame;
//! outbound messages use the same shape. A zero length data frame closes
//! the connection.

use crate::error::ZmqError;
use crate::message::{Blob, Msg, MsgFlags};
use crate::pipe::PipeRef;
use crate::socket::patterns::FairQueue;
use crate::socket::SendError;
use std::collections::HashMap;

struct Outpipe {
  pipe: PipeRef,
  active: bool,
}

pub struct StreamSocket {
  fq: FairQueue,
  /// Outbound pipes indexed by connection identity.
  outpipes: HashMap<Blob, Outpipe>,
  /// Destination of the message currently being written.
  current_out: Option<PipeRef>,
  /// True after the identity frame of an outbound message was consumed.
  more_out: bool,
  /// Seed for connection identities; increment and wrap.
  next_peer_id: u32,
  /// Identity frame built for a chunk read ahead of the application.
  prefetched_id: Option<Msg>,
  /// Chunk read ahead of the application.
  prefetched_msg: Option<Msg>,
  /// True when the identity frame was handed out but not the chunk yet.
  more_in: bool,
}

impl StreamSocket {
  pub fn new() -> Self {
    Self {
      fq: FairQueue::new(),
      outpipes: HashMap::new(),
      current_out: None,
      more_out: false,
      next_peer_id: rand::random(),
      prefetched_id: None,
      prefetched_msg: None,
      more_in: false,
    }
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    // Raw connections never introduce themselves; assign an identity.
    self.next_peer_id = self.next_peer_id.wrapping_add(1);
    let mut buf = [0u8; 5];
    buf[1..].copy_from_slice(&self.next_peer_id.to_be_bytes());
    let identity = Blob::from_slice(&buf);

    pipe.set_identity(identity.clone());
    self.outpipes.insert(
      identity,
      Outpipe {
        pipe: pipe.clone(),
        active: true,
      },
    );
    self.fq.attach(pipe);
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    self.outpipes.remove(&pipe.identity());
    self.fq.terminated(pipe);
    if self.current_out.as_ref() == Some(pipe) {
      self.current_out = None;
    }
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    self.fq.activated(pipe);
  }

  pub fn write_activated(&mut self, pipe: &PipeRef) {
    for outpipe in self.outpipes.values_mut() {
      if &outpipe.pipe == pipe {
        outpipe.active = true;
        return;
      }
    }
  }

  pub fn send(&mut self, mut msg: Msg) -> Result<(), SendError> {
    if !self.more_out {
      debug_assert!(self.current_out.is_none());

      // The first frame names the connection. An identity with no data
      // frame behind it is malformed; ignore it.
      if msg.is_more() {
        let identity = Blob::from_slice(msg.data().unwrap_or(&[]));
        let Some(outpipe) = self.outpipes.get_mut(&identity) else {
          return Err(SendError::Zmq(ZmqError::HostUnreachable(format!(
            "no connection with identity of {} bytes",
            identity.size()
          ))));
        };
        let pipe = outpipe.pipe.clone();
        if !outpipe.active || !pipe.check_write() {
          // Hand the identity frame back; the caller retries once the
          // connection drains.
          outpipe.active = false;
          return Err(SendError::Full(msg));
        }
        self.more_out = true;
        self.current_out = Some(pipe);
      }
      return Ok(());
    }

    // Raw data carries no framing on the wire.
    msg.clear_flags(MsgFlags::MORE);
    self.more_out = false;

    if let Some(pipe) = self.current_out.take() {
      // A zero length chunk closes the connection.
      if msg.size() == 0 {
        pipe.terminate(false);
        return Ok(());
      }
      if pipe.write(msg).is_ok() {
        pipe.flush();
      }
    }
    Ok(())
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    if let Some(id) = self.prefetched_id.take() {
      self.more_in = true;
      return Ok(Some(id));
    }
    if let Some(mut msg) = self.prefetched_msg.take() {
      msg.clear_flags(MsgFlags::MORE);
      self.more_in = false;
      return Ok(Some(msg));
    }

    if self.more_in {
      let Some((mut msg, _)) = self.fq.recv_from() else {
        return Ok(None);
      };
      msg.clear_flags(MsgFlags::MORE);
      self.more_in = false;
      return Ok(Some(msg));
    }

    let Some((msg, pipe)) = self.fq.recv_from() else {
      return Ok(None);
    };
    self.prefetched_msg = Some(msg);
    self.more_in = true;
    Ok(Some(Self::id_frame(&pipe)))
  }

  pub fn has_in(&mut self) -> bool {
    if self.more_in || self.prefetched_id.is_some() || self.prefetched_msg.is_some() {
      return true;
    }
    let Some((msg, pipe)) = self.fq.recv_from() else {
      return false;
    };
    self.prefetched_id = Some(Self::id_frame(&pipe));
    self.prefetched_msg = Some(msg);
    true
  }

  pub fn has_out(&mut self) -> bool {
    // Whether a write succeeds depends on the connection named by the
    // identity frame.
    true
  }

  fn id_frame(pipe: &PipeRef) -> Msg {
    let mut id = Msg::from_bytes(bytes::Bytes::copy_from_slice(&pipe.identity()));
    id.set_flags(MsgFlags::MORE);
    id
  }
}

impl Default for StreamSocket {
  fn default() -> Self {
    Self::new()
  }
}
