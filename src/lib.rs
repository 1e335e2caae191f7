// src/lib.rs

//! rzmq-patterns - the ZeroMQ socket pattern state machines in pure Rust.
//!
//! This library implements the messaging patterns (PAIR, PUSH/PULL,
//! PUB/SUB, REQ/REP, DEALER/ROUTER, CLIENT/SERVER, RADIO/DISH, and the
//! rest) as plain, non-blocking state machines over an abstract pipe
//! boundary, without any I/O or threading of their own. The owner wires
//! pipes in, forwards readiness events, and drives `send`/`recv`.

// Declare modules that make up the library.

/// Defines custom error types used throughout the library.
pub mod error;
/// Contains types related to message representation (Msg, Blob, etc.).
pub mod message;
/// The non-blocking pipe boundary the patterns are written against, plus
/// an in-memory implementation for in-process use and tests.
pub mod pipe;
/// Wire-format adapters translating RADIO/DISH group semantics to frames.
pub mod session;
/// The socket pattern state machines and the primitives they share.
pub mod socket;

// Re-export core types for user convenience, making them accessible
// directly from the crate root.
pub use error::ZmqError;
pub use message::{Blob, Msg, MsgFlags, MsgKind};
pub use pipe::{pair, Pipe, PipeRef};
pub use socket::{SendError, Socket, SocketOption, SocketType};

// --- Top-Level Library Information Functions ---

/// Major version number of the library.
const VERSION_MAJOR: i32 = 0;
/// Minor version number of the library.
const VERSION_MINOR: i32 = 1;
/// Patch version number of the library.
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
///
/// # Examples
///
/// ```
/// let (major, minor, patch) = rzmq_patterns::version();
/// println!("rzmq-patterns version: {}.{}.{}", major, minor, patch);
/// ```
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

/// Returns the major version number of the library.
pub fn version_major() -> i32 {
  VERSION_MAJOR
}

/// Returns the minor version number of the library.
pub fn version_minor() -> i32 {
  VERSION_MINOR
}

/// Returns the patch version number of the library.
pub fn version_patch() -> i32 {
  VERSION_PATCH
}
