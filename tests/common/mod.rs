// tests/common/mod.rs
#![allow(dead_code)] // Not every integration test uses every helper

use rzmq_patterns::message::{Msg, MsgFlags};
use rzmq_patterns::pipe::{self, PipeRef};
use rzmq_patterns::socket::Socket;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

static TRACING_INIT: Once = Once::new();

/// Initializes tracing once per test binary. Override the default filter
/// with RUST_LOG.
pub fn setup() {
  TRACING_INIT.call_once(|| {
    let default_filter = "rzmq_patterns=trace,debug";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_test_writer()
      .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
  });
}

pub const TEST_HWM: usize = 100;

/// Attaches a fresh in-memory pipe to the socket and returns the peer end.
pub fn attach_peer(socket: &mut Socket) -> PipeRef {
  attach_peer_hwm(socket, TEST_HWM)
}

/// Attaches a fresh in-memory pipe with the given high-water mark.
pub fn attach_peer_hwm(socket: &mut Socket, hwm: usize) -> PipeRef {
  let (local, peer) = pipe::pair(hwm);
  socket.attach_pipe(local);
  peer
}

/// Attaches a fresh in-memory pipe to the socket and returns both ends:
/// the socket's own end (for readiness callbacks) and the peer end.
pub fn attach_pair(socket: &mut Socket) -> (PipeRef, PipeRef) {
  let (local, peer) = pipe::pair(TEST_HWM);
  socket.attach_pipe(local.clone());
  (local, peer)
}

/// A single-part frame.
pub fn frame(data: &[u8]) -> Msg {
  Msg::from_vec(data.to_vec())
}

/// A frame with the MORE flag set.
pub fn frame_more(data: &[u8]) -> Msg {
  let mut msg = Msg::from_vec(data.to_vec());
  msg.set_flags(MsgFlags::MORE);
  msg
}

/// Writes a whole message (each slice one frame) on the peer end of a pipe
/// and flushes it, so the socket side can read it.
pub fn peer_send(peer: &PipeRef, parts: &[&[u8]]) {
  for (i, part) in parts.iter().enumerate() {
    let msg = if i + 1 < parts.len() {
      frame_more(part)
    } else {
      frame(part)
    };
    peer.write(msg).expect("peer write failed");
  }
  peer.flush();
}

/// Reads one frame from the peer end, panicking if none is ready.
pub fn peer_recv(peer: &PipeRef) -> Msg {
  peer.read().expect("expected a frame on the peer end")
}

/// Payload bytes of a frame.
pub fn data_of(msg: &Msg) -> Vec<u8> {
  msg.data().unwrap_or(&[]).to_vec()
}
