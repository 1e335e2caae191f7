// src/message/mod.rs

//! Types related to message representation (Msg, Blob, flags).

pub mod blob;
pub mod flags;
pub mod msg;

pub use blob::Blob;
pub use flags::MsgFlags;
pub use msg::{Msg, MsgKind, MAX_GROUP_LENGTH};
