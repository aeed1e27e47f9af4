//! Wire primitives shared by every layer of the AWD decoder.
//!
//! This crate provides the variable-length integer codec, the TLV tag
//! codec built on top of it, registry-wide composite tag addressing, and
//! the typed scalar [`Value`] representation produced by record decoding.

mod composite;
mod error;
mod tag;
mod timestamp;
mod value;
mod varint;

pub use composite::CompositeTag;
pub use error::WireError;
pub use tag::{Tag, TagKind, TagPayload, read_tag, read_tags};
pub use timestamp::AppleTimestamp;
pub use value::Value;
pub use varint::{MAX_VARINT_LEN, VarInt, read_varint};
