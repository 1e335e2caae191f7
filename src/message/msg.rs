// src/message/msg.rs

use crate::error::ZmqError;
use crate::message::flags::MsgFlags;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Maximum length of a RADIO/DISH group name in bytes.
pub const MAX_GROUP_LENGTH: usize = 255;

/// Distinguishes data frames from RADIO/DISH group control messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MsgKind {
  #[default]
  Data,
  /// A DISH peer joined a group.
  Join,
  /// A DISH peer left a group.
  Leave,
}

/// Represents a single message part (frame).
#[derive(Clone, Default)]
pub struct Msg {
  // Use Bytes for efficient slicing and cloning (reference counted)
  data: Option<Bytes>,
  flags: MsgFlags,
  kind: MsgKind,
  // Group tag for RADIO/DISH. Arc keeps per-subscriber clones cheap.
  group: Option<Arc<str>>,
  // Peer correlation id for CLIENT/SERVER and PEER. Zero means unset.
  routing_id: u32,
}

impl Msg {
  /// Creates an empty message with no data.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a message from a `Vec<u8>`, taking ownership.
  pub fn from_vec(data: Vec<u8>) -> Self {
    Self {
      data: Some(Bytes::from(data)),
      ..Default::default()
    }
  }

  /// Creates a message from `bytes::Bytes`.
  pub fn from_bytes(data: Bytes) -> Self {
    Self {
      data: Some(data),
      ..Default::default()
    }
  }

  /// Creates a message from a static byte slice (zero-copy).
  pub fn from_static(data: &'static [u8]) -> Self {
    Self {
      data: Some(Bytes::from_static(data)),
      ..Default::default()
    }
  }

  /// Creates a Join control message for the given group.
  pub fn new_join(group: &str) -> Result<Self, ZmqError> {
    let mut msg = Self::new();
    msg.kind = MsgKind::Join;
    msg.set_group(group)?;
    Ok(msg)
  }

  /// Creates a Leave control message for the given group.
  pub fn new_leave(group: &str) -> Result<Self, ZmqError> {
    let mut msg = Self::new();
    msg.kind = MsgKind::Leave;
    msg.set_group(group)?;
    Ok(msg)
  }

  /// Returns a reference to the message payload bytes, if any.
  pub fn data(&self) -> Option<&[u8]> {
    self.data.as_deref()
  }

  /// Returns the size of the message payload in bytes.
  pub fn size(&self) -> usize {
    self.data.as_ref().map_or(0, |d| d.len())
  }

  /// Returns the flags associated with the message.
  pub fn flags(&self) -> MsgFlags {
    self.flags
  }

  /// Sets the given flags on the message (e.g., `MsgFlags::MORE`).
  pub fn set_flags(&mut self, flags: MsgFlags) {
    self.flags |= flags;
  }

  /// Clears the given flags on the message.
  pub fn clear_flags(&mut self, flags: MsgFlags) {
    self.flags &= !flags;
  }

  /// Returns the message kind (data or group control).
  pub fn kind(&self) -> MsgKind {
    self.kind
  }

  /// Returns the group this message is published to, if any.
  pub fn group(&self) -> Option<&str> {
    self.group.as_deref()
  }

  /// Tags the message with a group name.
  pub fn set_group(&mut self, group: &str) -> Result<(), ZmqError> {
    if group.len() > MAX_GROUP_LENGTH {
      return Err(ZmqError::InvalidArgument(format!(
        "group name exceeds {} bytes",
        MAX_GROUP_LENGTH
      )));
    }
    self.group = Some(Arc::from(group));
    Ok(())
  }

  /// Returns the routing id, or zero when unset.
  pub fn routing_id(&self) -> u32 {
    self.routing_id
  }

  /// Sets the routing id used by SERVER/CLIENT/PEER addressing.
  pub fn set_routing_id(&mut self, routing_id: u32) {
    self.routing_id = routing_id;
  }

  /// Clears the routing id.
  pub fn reset_routing_id(&mut self) {
    self.routing_id = 0;
  }

  // --- Flag Helpers ---

  /// Checks if the `MORE` flag is set.
  pub fn is_more(&self) -> bool {
    self.flags.contains(MsgFlags::MORE)
  }

  /// Checks if the `COMMAND` flag is set.
  pub fn is_command(&self) -> bool {
    self.flags.contains(MsgFlags::COMMAND)
  }

  /// Checks if the `IDENTITY` flag is set.
  pub fn is_identity(&self) -> bool {
    self.flags.contains(MsgFlags::IDENTITY)
  }

  /// Checks if this is a Join control message.
  pub fn is_join(&self) -> bool {
    self.kind == MsgKind::Join
  }

  /// Checks if this is a Leave control message.
  pub fn is_leave(&self) -> bool {
    self.kind == MsgKind::Leave
  }

  /// Returns the internal `Bytes` object if data is present.
  ///
  /// Cloning `Bytes` is cheap as it is reference-counted; the distributor
  /// relies on this when fanning one payload out to many pipes.
  pub fn data_bytes(&self) -> Option<Bytes> {
    self.data.clone()
  }
}

impl fmt::Debug for Msg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Msg")
      .field("size", &self.size())
      .field("flags", &self.flags)
      .field("kind", &self.kind)
      .field("group", &self.group)
      .field("routing_id", &self.routing_id)
      .finish()
  }
}
