// src/socket/mod.rs

//! Socket pattern state machines and the primitives they are built from.
//!
//! Each pattern is a plain struct driven entirely by its owner: pipes are
//! attached and terminated explicitly, readiness changes arrive through
//! `read_activated` / `write_activated`, and `send` / `recv` never block.
//! [`Socket`] wraps the concrete patterns in one enum so callers can hold
//! any of them behind a single type without dynamic dispatch.

pub mod patterns;

pub mod options;

pub mod client_socket;
pub mod dealer_socket;
pub mod dish_socket;
pub mod gather_socket;
pub mod pair_socket;
pub mod peer_socket;
pub mod pub_socket;
pub mod pull_socket;
pub mod push_socket;
pub mod radio_socket;
pub mod rep_socket;
pub mod req_socket;
pub mod router_socket;
pub mod scatter_socket;
pub mod server_socket;
pub mod stream_socket;
pub mod sub_socket;
pub mod xpub_socket;
pub mod xsub_socket;

pub use options::SocketOption;

use crate::error::ZmqError;
use crate::message::Msg;
use crate::pipe::PipeRef;
use thiserror::Error;

use client_socket::ClientSocket;
use dealer_socket::DealerSocket;
use dish_socket::DishSocket;
use gather_socket::GatherSocket;
use pair_socket::PairSocket;
use peer_socket::PeerSocket;
use pub_socket::PubSocket;
use pull_socket::PullSocket;
use push_socket::PushSocket;
use radio_socket::RadioSocket;
use rep_socket::RepSocket;
use req_socket::ReqSocket;
use router_socket::RouterSocket;
use scatter_socket::ScatterSocket;
use server_socket::ServerSocket;
use stream_socket::StreamSocket;
use sub_socket::SubSocket;
use xpub_socket::XpubSocket;
use xsub_socket::XsubSocket;

/// Error returned by `send`.
#[derive(Error, Debug)]
pub enum SendError {
  /// The pattern could not take the frame right now; it is handed back so
  /// the caller can retry once a pipe becomes writable again.
  #[error("send queue full")]
  Full(Msg),
  #[error(transparent)]
  Zmq(#[from] ZmqError),
}

/// The supported socket patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SocketType {
  Pair,
  Push,
  Pull,
  Scatter,
  Gather,
  Client,
  Server,
  Dealer,
  Router,
  Req,
  Rep,
  Peer,
  Pub,
  Sub,
  Xpub,
  Xsub,
  Radio,
  Dish,
  Stream,
}

/// A socket pattern state machine.
///
/// Enum dispatch keeps every call a direct match on the pattern; there is
/// no trait object between the caller and the state machine.
pub enum Socket {
  Pair(PairSocket),
  Push(PushSocket),
  Pull(PullSocket),
  Scatter(ScatterSocket),
  Gather(GatherSocket),
  Client(ClientSocket),
  Server(ServerSocket),
  Dealer(DealerSocket),
  Router(RouterSocket),
  Req(ReqSocket),
  Rep(RepSocket),
  Peer(PeerSocket),
  Pub(PubSocket),
  Sub(SubSocket),
  Xpub(XpubSocket),
  Xsub(XsubSocket),
  Radio(RadioSocket),
  Dish(DishSocket),
  Stream(StreamSocket),
}

/// Forwards a call to whichever pattern the enum holds.
macro_rules! dispatch {
  ($self:expr, $inner:ident => $body:expr) => {
    match $self {
      Socket::Pair($inner) => $body,
      Socket::Push($inner) => $body,
      Socket::Pull($inner) => $body,
      Socket::Scatter($inner) => $body,
      Socket::Gather($inner) => $body,
      Socket::Client($inner) => $body,
      Socket::Server($inner) => $body,
      Socket::Dealer($inner) => $body,
      Socket::Router($inner) => $body,
      Socket::Req($inner) => $body,
      Socket::Rep($inner) => $body,
      Socket::Peer($inner) => $body,
      Socket::Pub($inner) => $body,
      Socket::Sub($inner) => $body,
      Socket::Xpub($inner) => $body,
      Socket::Xsub($inner) => $body,
      Socket::Radio($inner) => $body,
      Socket::Dish($inner) => $body,
      Socket::Stream($inner) => $body,
    }
  };
}

impl Socket {
  pub fn new(socket_type: SocketType) -> Self {
    match socket_type {
      SocketType::Pair => Socket::Pair(PairSocket::new()),
      SocketType::Push => Socket::Push(PushSocket::new()),
      SocketType::Pull => Socket::Pull(PullSocket::new()),
      SocketType::Scatter => Socket::Scatter(ScatterSocket::new()),
      SocketType::Gather => Socket::Gather(GatherSocket::new()),
      SocketType::Client => Socket::Client(ClientSocket::new()),
      SocketType::Server => Socket::Server(ServerSocket::new()),
      SocketType::Dealer => Socket::Dealer(DealerSocket::new()),
      SocketType::Router => Socket::Router(RouterSocket::new()),
      SocketType::Req => Socket::Req(ReqSocket::new()),
      SocketType::Rep => Socket::Rep(RepSocket::new()),
      SocketType::Peer => Socket::Peer(PeerSocket::new()),
      SocketType::Pub => Socket::Pub(PubSocket::new()),
      SocketType::Sub => Socket::Sub(SubSocket::new()),
      SocketType::Xpub => Socket::Xpub(XpubSocket::new()),
      SocketType::Xsub => Socket::Xsub(XsubSocket::new()),
      SocketType::Radio => Socket::Radio(RadioSocket::new()),
      SocketType::Dish => Socket::Dish(DishSocket::new()),
      SocketType::Stream => Socket::Stream(StreamSocket::new()),
    }
  }

  pub fn socket_type(&self) -> SocketType {
    match self {
      Socket::Pair(_) => SocketType::Pair,
      Socket::Push(_) => SocketType::Push,
      Socket::Pull(_) => SocketType::Pull,
      Socket::Scatter(_) => SocketType::Scatter,
      Socket::Gather(_) => SocketType::Gather,
      Socket::Client(_) => SocketType::Client,
      Socket::Server(_) => SocketType::Server,
      Socket::Dealer(_) => SocketType::Dealer,
      Socket::Router(_) => SocketType::Router,
      Socket::Req(_) => SocketType::Req,
      Socket::Rep(_) => SocketType::Rep,
      Socket::Peer(_) => SocketType::Peer,
      Socket::Pub(_) => SocketType::Pub,
      Socket::Sub(_) => SocketType::Sub,
      Socket::Xpub(_) => SocketType::Xpub,
      Socket::Xsub(_) => SocketType::Xsub,
      Socket::Radio(_) => SocketType::Radio,
      Socket::Dish(_) => SocketType::Dish,
      Socket::Stream(_) => SocketType::Stream,
    }
  }

  /// Hands a newly established pipe to the pattern.
  pub fn attach_pipe(&mut self, pipe: PipeRef) {
    dispatch!(self, socket => socket.pipe_attached(pipe))
  }

  /// Tells the pattern a pipe is gone for good.
  pub fn pipe_terminated(&mut self, pipe: &PipeRef) {
    dispatch!(self, socket => socket.pipe_terminated(pipe))
  }

  /// A pipe that previously had nothing to read became readable.
  pub fn read_activated(&mut self, pipe: &PipeRef) {
    dispatch!(self, socket => socket.read_activated(pipe))
  }

  /// A pipe that previously refused writes became writable.
  pub fn write_activated(&mut self, pipe: &PipeRef) {
    dispatch!(self, socket => socket.write_activated(pipe))
  }

  /// A pipe dropped its queue and reconnected. Subscriber patterns replay
  /// their subscription state; everything else ignores it.
  pub fn hiccuped(&mut self, pipe: &PipeRef) {
    match self {
      Socket::Xsub(socket) => socket.hiccuped(pipe),
      Socket::Sub(socket) => socket.hiccuped(pipe),
      Socket::Dish(socket) => socket.hiccuped(pipe),
      _ => {}
    }
  }

  /// Sends one frame. `SendError::Full` hands the frame back when the
  /// pattern cannot take it until a pipe becomes writable.
  pub fn send(&mut self, msg: Msg) -> Result<(), SendError> {
    dispatch!(self, socket => socket.send(msg))
  }

  /// Receives one frame, or `Ok(None)` when nothing is ready.
  pub fn recv(&mut self) -> Result<Option<Msg>, ZmqError> {
    dispatch!(self, socket => socket.recv())
  }

  /// True if `recv` would return a frame.
  pub fn has_in(&mut self) -> bool {
    dispatch!(self, socket => socket.has_in())
  }

  /// True if the pattern would currently accept a frame.
  pub fn has_out(&mut self) -> bool {
    dispatch!(self, socket => socket.has_out())
  }

  pub fn set_option(&mut self, option: SocketOption) -> Result<(), ZmqError> {
    match self {
      Socket::Router(socket) => socket.set_option(option),
      Socket::Req(socket) => socket.set_option(option),
      Socket::Rep(socket) => socket.set_option(option),
      Socket::Pub(socket) => socket.set_option(option),
      Socket::Sub(socket) => socket.set_option(option),
      Socket::Xpub(socket) => socket.set_option(option),
      Socket::Xsub(socket) => socket.set_option(option),
      _ => Err(ZmqError::InvalidArgument(format!(
        "option not supported by this socket type: {:?}",
        option
      ))),
    }
  }

  /// Joins a RADIO/DISH group.
  pub fn join(&mut self, group: &str) -> Result<(), ZmqError> {
    match self {
      Socket::Dish(socket) => socket.join(group),
      _ => Err(ZmqError::InvalidSocketType("only DISH sockets join groups")),
    }
  }

  /// Leaves a RADIO/DISH group.
  pub fn leave(&mut self, group: &str) -> Result<(), ZmqError> {
    match self {
      Socket::Dish(socket) => socket.leave(group),
      _ => Err(ZmqError::InvalidSocketType("only DISH sockets leave groups")),
    }
  }
}
