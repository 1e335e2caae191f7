// src/socket/options.rs

//! Pattern-specific socket options.
//!
//! Options are a typed enum rather than integer option ids; this layer has
//! no C compatibility surface. Each socket accepts the options that apply
//! to it and rejects the rest with `ZmqError::InvalidArgument`.

use crate::message::Blob;

#[derive(Debug, Clone)]
pub enum SocketOption {
  /// SUB: add a topic prefix. XPUB manual mode: subscribe the pipe the
  /// last surfaced subscription came from.
  Subscribe(Vec<u8>),
  /// SUB: remove a topic prefix. XPUB manual mode: unsubscribe the pipe
  /// the last surfaced subscription came from.
  Unsubscribe(Vec<u8>),
  /// XSUB: when false, deliver inbound messages without topic filtering.
  Filter(bool),
  /// XPUB manual mode: reassign the identity of the last surfaced pipe.
  Identity(Blob),
  /// ROUTER: report unroutable messages instead of dropping them.
  RouterMandatory(bool),
  /// ROUTER: a reconnecting peer may take over its old identity.
  RouterHandover(bool),
  /// ROUTER: raw mode, no identity framing on the wire.
  RouterRawSocket(bool),
  /// XPUB: surface duplicate subscriptions, not just unique ones.
  XpubVerbose(bool),
  /// XPUB: subscriptions are applied by the application, not automatically.
  XpubManual(bool),
  /// XPUB: accept broadcast frames (first byte 2) from subscribers.
  XpubBroadcast(bool),
  /// XPUB: frame written to every newly attached pipe.
  XpubWelcomeMessage(Option<Vec<u8>>),
  /// REQ: prefix requests with a correlation id and validate replies.
  ReqCorrelate(bool),
  /// REQ: allow sending a new request while a reply is outstanding.
  ReqRelaxed(bool),
}
