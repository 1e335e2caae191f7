// src/error.rs

use thiserror::Error;

/// Errors produced by the pattern layer.
///
/// Primitives (fair queue, load balancer, distributor, tries) never fail;
/// they signal backpressure through their return values. Only the socket
/// state machines produce `ZmqError`.
#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum ZmqError {
  #[error("Invalid argument provided: {0}")]
  InvalidArgument(String), // Corresponds to EINVAL for non-option errors

  #[error("Host is unreachable: {0}")]
  HostUnreachable(String), // Unknown or inactive peer identity, EHOSTUNREACH

  // --- State Errors ---
  #[error("Operation is invalid for the socket type ({0})")]
  InvalidSocketType(&'static str),
  #[error("Operation is invalid for the current socket state: {0}")]
  InvalidState(&'static str), // EFSM

  // --- Protocol Errors ---
  #[error("Protocol violation: {0}")]
  ProtocolViolation(String), // EPROTO

  #[error("Invalid message format for operation: {0}")]
  InvalidMessage(String),

  // --- Resource Limits ---
  #[error("Resource limit reached (e.g., HWM)")]
  ResourceLimitReached, // EAGAIN / EWOULDBLOCK equivalent

  // --- Internal Errors ---
  #[error("Internal library error: {0}")]
  Internal(String),
}
