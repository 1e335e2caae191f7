// src/message/flags.rs

use bitflags::bitflags;

bitflags! {
  /// Flags associated with a message frame.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
  pub struct MsgFlags: u8 {
    /// More message parts follow this one in a logical message.
    const MORE = 0b01;
    /// This frame is an internal command, not application data.
    const COMMAND = 0b10;
    /// This frame carries a peer identity (routing handshake frame).
    const IDENTITY = 0b0100_0000;
  }
}
