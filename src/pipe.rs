// src/pipe.rs

//! The pipe boundary the pattern state machines are written against.
//!
//! A `Pipe` is one socket's view of a bidirectional frame queue to a single
//! peer. All calls are non-blocking: `read` and `write` either complete
//! immediately or report that they would block, and the owning event loop
//! re-arms the pattern through its `read_activated` / `write_activated`
//! hooks once the pipe becomes usable again.

use crate::message::{Blob, Msg};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// One endpoint of a frame queue between a socket and a peer.
pub trait Pipe {
  /// Pops the next inbound frame, or `None` if none is ready.
  fn read(&mut self) -> Option<Msg>;

  /// Stages an outbound frame. `Err` returns the frame when the pipe
  /// cannot accept it (peer gone or high-water mark reached).
  ///
  /// Once the first frame of a multipart message has been accepted, the
  /// remaining frames of that message must be accepted as well; the
  /// multiplexing primitives rely on this to keep messages atomic.
  fn write(&mut self, msg: Msg) -> Result<(), Msg>;

  /// Releases staged frames to the reader. Readers never observe a
  /// partially flushed message.
  fn flush(&mut self);

  /// Discards frames staged since the last flush (abandoning a partially
  /// written message).
  fn rollback(&mut self);

  /// True if a frame is ready to read.
  fn check_read(&self) -> bool;

  /// True if a frame would currently be accepted by `write`.
  fn check_write(&self) -> bool;

  /// Initiates teardown. `delay` keeps already staged/queued frames
  /// deliverable; without it they are discarded.
  fn terminate(&mut self, delay: bool);

  /// Disables the termination delay for this pipe.
  fn set_nodelay(&mut self);

  /// Peer identity used by ROUTER/STREAM addressing.
  fn identity(&self) -> Blob;
  fn set_identity(&mut self, identity: Blob);

  /// Numeric peer id used by SERVER/PEER addressing. Zero means unset.
  fn routing_id(&self) -> u32;
  fn set_routing_id(&mut self, routing_id: u32);

  /// False once the pipe has been terminated from either side.
  fn is_active(&self) -> bool;
}

/// Shared handle to a pipe.
///
/// Patterns hold the same pipe in several structures at once (a fair queue
/// and a routing table, a trie and a distributor), so the handle is cheap to
/// clone and compares by pointer identity.
#[derive(Clone)]
pub struct PipeRef {
  inner: Rc<RefCell<dyn Pipe>>,
}

impl PipeRef {
  pub fn new<P: Pipe + 'static>(pipe: P) -> Self {
    Self {
      inner: Rc::new(RefCell::new(pipe)),
    }
  }

  pub fn read(&self) -> Option<Msg> {
    self.inner.borrow_mut().read()
  }

  pub fn write(&self, msg: Msg) -> Result<(), Msg> {
    self.inner.borrow_mut().write(msg)
  }

  pub fn flush(&self) {
    self.inner.borrow_mut().flush();
  }

  pub fn rollback(&self) {
    self.inner.borrow_mut().rollback();
  }

  pub fn check_read(&self) -> bool {
    self.inner.borrow().check_read()
  }

  pub fn check_write(&self) -> bool {
    self.inner.borrow().check_write()
  }

  pub fn terminate(&self, delay: bool) {
    self.inner.borrow_mut().terminate(delay);
  }

  pub fn set_nodelay(&self) {
    self.inner.borrow_mut().set_nodelay();
  }

  pub fn identity(&self) -> Blob {
    self.inner.borrow().identity()
  }

  pub fn set_identity(&self, identity: Blob) {
    self.inner.borrow_mut().set_identity(identity);
  }

  pub fn routing_id(&self) -> u32 {
    self.inner.borrow().routing_id()
  }

  pub fn set_routing_id(&self, routing_id: u32) {
    self.inner.borrow_mut().set_routing_id(routing_id);
  }

  pub fn is_active(&self) -> bool {
    self.inner.borrow().is_active()
  }

  fn key(&self) -> usize {
    Rc::as_ptr(&self.inner) as *const () as usize
  }
}

impl PartialEq for PipeRef {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.inner, &other.inner)
  }
}

impl Eq for PipeRef {}

impl Hash for PipeRef {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.key().hash(state);
  }
}

impl fmt::Debug for PipeRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipeRef").field("ptr", &self.key()).finish()
  }
}

// --- In-memory pipe pair ---

struct Queue {
  msgs: VecDeque<Msg>,
  closed: bool,
}

type SharedQueue = Rc<RefCell<Queue>>;

/// In-process pipe endpoint, the moral equivalent of an inproc transport.
///
/// Writes are staged locally and handed to the peer's queue on `flush`, so
/// a reader only ever sees whole flushed batches.
pub struct MemPipe {
  send: SharedQueue,
  recv: SharedQueue,
  staged: Vec<Msg>,
  hwm: usize,
  // True while the first frame of the current outbound message has been
  // accepted; later frames of that message bypass the HWM check.
  in_progress: bool,
  active: bool,
  nodelay: bool,
  identity: Blob,
  routing_id: u32,
}

impl MemPipe {
  fn queued(&self) -> usize {
    self.staged.len() + self.send.borrow().msgs.len()
  }
}

impl Pipe for MemPipe {
  fn read(&mut self) -> Option<Msg> {
    self.recv.borrow_mut().msgs.pop_front()
  }

  fn write(&mut self, msg: Msg) -> Result<(), Msg> {
    if !self.active || self.send.borrow().closed {
      return Err(msg);
    }
    if !self.in_progress && self.hwm > 0 && self.queued() >= self.hwm {
      return Err(msg);
    }
    self.in_progress = msg.is_more();
    self.staged.push(msg);
    Ok(())
  }

  fn flush(&mut self) {
    let mut queue = self.send.borrow_mut();
    if queue.closed {
      self.staged.clear();
      return;
    }
    queue.msgs.extend(self.staged.drain(..));
  }

  fn rollback(&mut self) {
    self.staged.clear();
    self.in_progress = false;
  }

  fn check_read(&self) -> bool {
    !self.recv.borrow().msgs.is_empty()
  }

  fn check_write(&self) -> bool {
    if !self.active || self.send.borrow().closed {
      return false;
    }
    self.in_progress || self.hwm == 0 || self.queued() < self.hwm
  }

  fn terminate(&mut self, delay: bool) {
    let delay = delay && !self.nodelay;
    if delay {
      self.flush();
    } else {
      self.staged.clear();
      self.send.borrow_mut().msgs.clear();
    }
    self.active = false;
    self.send.borrow_mut().closed = true;
    self.recv.borrow_mut().closed = true;
    tracing::trace!(delay = delay, "pipe terminated");
  }

  fn set_nodelay(&mut self) {
    self.nodelay = true;
  }

  fn identity(&self) -> Blob {
    self.identity.clone()
  }

  fn set_identity(&mut self, identity: Blob) {
    self.identity = identity;
  }

  fn routing_id(&self) -> u32 {
    self.routing_id
  }

  fn set_routing_id(&mut self, routing_id: u32) {
    self.routing_id = routing_id;
  }

  fn is_active(&self) -> bool {
    self.active && !self.recv.borrow().closed
  }
}

/// Creates a connected in-memory pipe pair with the given high-water mark
/// per direction (`0` disables the limit).
pub fn pair(hwm: usize) -> (PipeRef, PipeRef) {
  let a_to_b = Rc::new(RefCell::new(Queue {
    msgs: VecDeque::new(),
    closed: false,
  }));
  let b_to_a = Rc::new(RefCell::new(Queue {
    msgs: VecDeque::new(),
    closed: false,
  }));
  let a = MemPipe {
    send: a_to_b.clone(),
    recv: b_to_a.clone(),
    staged: Vec::new(),
    hwm,
    in_progress: false,
    active: true,
    nodelay: false,
    identity: Blob::new(),
    routing_id: 0,
  };
  let b = MemPipe {
    send: b_to_a,
    recv: a_to_b,
    staged: Vec::new(),
    hwm,
    in_progress: false,
    active: true,
    nodelay: false,
    identity: Blob::new(),
    routing_id: 0,
  };
  (PipeRef::new(a), PipeRef::new(b))
}
