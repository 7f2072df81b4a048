//! Protocol module containing message types, wire primitives and the codec.

pub mod codec;
pub mod messages;
pub mod wire;

pub use codec::ProtocolError;
pub use messages::*;
pub use wire::{write_i32, write_length_prefixed_bytes, WireReader};
