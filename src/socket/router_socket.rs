// src/socket/router_socket.rs

//! ROUTER: identity-addressed request routing.
//!
//! Inbound messages are prefixed with the identity of the pipe they came
//! from; the first frame of an outbound message names the destination pipe
//! and is consumed by the socket. Peers that do not declare an identity in
//! their first frame are assigned a synthetic 5-byte `[0, id]` one.

use crate::error::ZmqError;
use crate::message::{Blob, Msg, MsgFlags};
use crate::pipe::PipeRef;
use crate::socket::patterns::FairQueue;
use crate::socket::options::SocketOption;
use crate::socket::SendError;
use std::collections::{HashMap, HashSet};

struct Outpipe {
  pipe: PipeRef,
  active: bool,
}

pub struct RouterSocket {
  fq: FairQueue,
  /// Identity frame pre-built for a message read ahead of the application.
  prefetched_id: Option<Msg>,
  /// First body frame read ahead of the application.
  prefetched_msg: Option<Msg>,
  /// True while the application is mid-way through reading a message.
  more_in: bool,
  /// Pipes that have not declared an identity yet.
  anonymous_pipes: HashSet<PipeRef>,
  /// Outbound pipes indexed by peer identity.
  outpipes: HashMap<Blob, Outpipe>,
  /// Destination of the message currently being written.
  current_out: Option<PipeRef>,
  /// True while the application is mid-way through writing a message.
  more_out: bool,
  /// Seed for synthetic peer identities; increment and wrap.
  next_peer_id: u32,
  /// Report unroutable messages instead of silently dropping them.
  mandatory: bool,
  /// A reconnecting peer may take over an existing identity.
  handover: bool,
  /// Raw mode: no identity handshake, no MORE flags on the wire.
  raw_socket: bool,
}

impl RouterSocket {
  pub fn new() -> Self {
    Self {
      fq: FairQueue::new(),
      prefetched_id: None,
      prefetched_msg: None,
      more_in: false,
      anonymous_pipes: HashSet::new(),
      outpipes: HashMap::new(),
      current_out: None,
      more_out: false,
      next_peer_id: rand::random(),
      mandatory: false,
      handover: false,
      raw_socket: false,
    }
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    match option {
      SocketOption::RouterMandatory(value) => self.mandatory = value,
      SocketOption::RouterHandover(value) => self.handover = value,
      SocketOption::RouterRawSocket(value) => self.raw_socket = value,
      other => {
        return Err(ZmqError::InvalidArgument(format!(
          "option not supported by ROUTER: {:?}",
          other
        )))
      }
    }
    Ok(())
  }

  pub fn pipe_attached(&mut self, pipe: PipeRef) {
    if self.identify_peer(&pipe) {
      self.fq.attach(pipe);
    } else {
      self.anonymous_pipes.insert(pipe);
    }
  }

  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    if self.anonymous_pipes.remove(pipe) {
      return;
    }
    self.outpipes.remove(&pipe.identity());
    self.fq.terminated(pipe);
    if self.current_out.as_ref() == Some(pipe) {
      self.current_out = None;
    }
  }

  pub fn read_activated(&mut self, pipe: &PipeRef) {
    if !self.anonymous_pipes.contains(pipe) {
      self.fq.activated(pipe);
    } else if self.identify_peer(pipe) {
      self.anonymous_pipes.remove(pipe);
      self.fq.attach(pipe.clone());
    }
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
    // The first part of the message is the identity of the destination.
    if !self.more_out {
      debug_assert!(self.current_out.is_none());

      // A prefix with no subsequent frames is malformed; ignore it.
      if msg.is_more() {
        self.more_out = true;

        let identity = Blob::from_slice(msg.data().unwrap_or(&[]));
        if let Some(outpipe) = self.outpipes.get_mut(&identity) {
          let pipe = outpipe.pipe.clone();
          if !outpipe.active || !pipe.check_write() {
            outpipe.active = false;
            if self.mandatory {
              self.more_out = false;
              return Err(SendError::Full(msg));
            }
            self.current_out = None;
          } else {
            self.current_out = Some(pipe);
          }
        } else if self.mandatory {
          self.more_out = false;
          return Err(SendError::Zmq(ZmqError::HostUnreachable(format!(
            "no peer with identity of {} bytes",
            identity.size()
          ))));
        }
      }
      // The identity frame is consumed either way.
      return Ok(());
    }

    if self.raw_socket {
      msg.clear_flags(MsgFlags::MORE);
    }

    self.more_out = msg.is_more();

    if let Some(pipe) = self.current_out.clone() {
      // In raw mode a zero length frame closes the connection; pending
      // frames on the pipe are dropped.
      if self.raw_socket && msg.size() == 0 {
        pipe.terminate(false);
        self.current_out = None;
        return Ok(());
      }

      match pipe.write(msg) {
        Ok(()) => {
          if !self.more_out {
            pipe.flush();
            self.current_out = None;
          }
        }
        Err(_dropped) => {
          self.current_out = None;
        }
      }
    }
    // With no destination pipe the frame is silently dropped.
    Ok(())
  }

  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    if let Some(id) = self.prefetched_id.take() {
      self.more_in = id.is_more();
      return Ok(Some(id));
    }
    if let Some(msg) = self.prefetched_msg.take() {
      self.more_in = msg.is_more();
      return Ok(Some(msg));
    }

    let Some((msg, pipe)) = self.recv_skip_identity() else {
      return Ok(None);
    };

    // Mid-message: hand the next part straight through.
    if self.more_in {
      self.more_in = msg.is_more();
      return Ok(Some(msg));
    }

    // Start of a message: stash the body frame and return the identity of
    // the peer first.
    self.prefetched_msg = Some(msg);
    let mut id = Msg::from_bytes(bytes::Bytes::copy_from_slice(&pipe.identity()));
    id.set_flags(MsgFlags::MORE);
    self.more_in = true;
    Ok(Some(id))
  }

  pub fn has_in(&mut self) -> bool {
    if self.more_in || self.prefetched_id.is_some() || self.prefetched_msg.is_some() {
      return true;
    }

    let Some((msg, pipe)) = self.recv_skip_identity() else {
      return false;
    };
    let mut id = Msg::from_bytes(bytes::Bytes::copy_from_slice(&pipe.identity()));
    id.set_flags(MsgFlags::MORE);
    self.prefetched_id = Some(id);
    self.prefetched_msg = Some(msg);
    true
  }

  pub fn has_out(&mut self) -> bool {
    // A ROUTER is always ready to accept; whether the write succeeds
    // depends on the destination of the message.
    true
  }

  /// Abandons the message parts written since the last flush. Used by REP
  /// when a malformed backtrace stack has to be discarded.
  pub(crate) fn rollback(&mut self) {
    if let Some(pipe) = self.current_out.take() {
      pipe.rollback();
    }
    self.more_out = false;
  }

  fn recv_skip_identity(&mut self) -> Option<(Msg, PipeRef)> {
    // A peer re-sends its identity after reconnection; those frames are
    // not delivered to the application.
    loop {
      let (msg, pipe) = self.fq.recv_from()?;
      if !msg.is_identity() {
        return Some((msg, pipe));
      }
    }
  }

  fn generate_peer_id(&mut self) -> Blob {
    self.next_peer_id = self.next_peer_id.wrapping_add(1);
    let mut buf = [0u8; 5];
    buf[1..].copy_from_slice(&self.next_peer_id.to_be_bytes());
    Blob::from_slice(&buf)
  }

  fn identify_peer(&mut self, pipe: &PipeRef) -> bool {
    let identity = if self.raw_socket {
      // Raw peers never introduce themselves.
      self.generate_peer_id()
    } else {
      let Some(msg) = pipe.read() else {
        return false;
      };
      if msg.size() == 0 {
        // Fall back on auto-generation.
        self.generate_peer_id()
      } else {
        let identity = Blob::from_slice(msg.data().unwrap_or(&[]));
        if self.outpipes.contains_key(&identity) {
          if !self.handover {
            // Ignore peers with duplicate identities.
            tracing::debug!("rejecting peer with duplicate identity");
            return false;
          }
          // Let the new connection take over the identity: park the old
          // pipe under a fresh synthetic identity and shut it down.
          let new_identity = self.generate_peer_id();
          if let Some(existing) = self.outpipes.remove(&identity) {
            existing.pipe.set_identity(new_identity.clone());
            existing.pipe.terminate(true);
            self.outpipes.insert(new_identity, existing);
          }
        }
        identity
      }
    };

    pipe.set_identity(identity.clone());
    self.outpipes.insert(
      identity,
      Outpipe {
        pipe: pipe.clone(),
        active: true,
      },
    );
    true
  }
}

impl Default for RouterSocket {
  fn default() -> Self {
    Self::new()
  }
}
