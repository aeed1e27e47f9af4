//! Tag/value decoding layered on the varint primitive.
//!
//! A tag's leading varint packs a field index in the high bits and a
//! three-bit encoding-kind flag set in the low bits. Length-prefixed
//! tags carry an opaque payload (a string, raw bytes, or a nested tag
//! stream); all other tags carry one scalar varint.

use bytes::{Buf, Bytes};

use crate::error::WireError;
use crate::varint::read_varint;

bitflags::bitflags! {
    /// Encoding-kind bits carried in the low three bits of a tag's
    /// leading varint.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TagKind: u8 {
        /// The tag participates in the extension mechanism.
        const EXTENSION = 0b001;
        /// The value is a length-prefixed payload rather than a scalar.
        const LENGTH_PREFIXED = 0b010;
        /// The field may occur more than once.
        const REPEATED = 0b100;
    }
}

/// Decoded payload of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPayload {
    /// Scalar varint value. The raw encoded span is retained because one
    /// known producer emits scalars wider than 64 bits (signed enum
    /// members); `value` holds the wrapped decode for those.
    Scalar { value: u64, raw: Bytes },
    /// Length-prefixed opaque bytes: a string, raw data, or nested tags.
    Opaque(Bytes),
}

/// One tag/value pair from a TLV stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub index: u64,
    pub kind: TagKind,
    pub payload: TagPayload,
}

impl Tag {
    /// Scalar value, if this tag carries one.
    pub fn scalar(&self) -> Option<u64> {
        match &self.payload {
            TagPayload::Scalar { value, .. } => Some(*value),
            TagPayload::Opaque(_) => None,
        }
    }

    /// Opaque payload bytes, if this tag carries them.
    pub fn opaque(&self) -> Option<&Bytes> {
        match &self.payload {
            TagPayload::Scalar { .. } => None,
            TagPayload::Opaque(data) => Some(data),
        }
    }
}

/// Decode one tag from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` is at clean EOF before any tag; any
/// truncation after the leading varint is a hard error.
pub fn read_tag(buf: &mut Bytes) -> Result<Option<Tag>, WireError> {
    let Some(lead) = read_varint(buf)? else {
        return Ok(None);
    };
    let kind = TagKind::from_bits_truncate((lead.value & 0b111) as u8);
    let index = lead.value >> 3;

    let payload = if kind.contains(TagKind::LENGTH_PREFIXED) {
        let length = read_varint(buf)?.ok_or(WireError::TruncatedInput)?;
        let length = usize::try_from(length.value).map_err(|_| WireError::IntegerOverflow)?;
        if buf.remaining() < length {
            return Err(WireError::TruncatedInput);
        }
        TagPayload::Opaque(buf.copy_to_bytes(length))
    } else {
        let snapshot = buf.clone();
        let scalar = read_varint(buf)?.ok_or(WireError::TruncatedInput)?;
        TagPayload::Scalar {
            value: scalar.value,
            raw: snapshot.slice(..scalar.byte_length),
        }
    };

    Ok(Some(Tag {
        index,
        kind,
        payload,
    }))
}

/// Decode an entire buffer as a tag stream.
///
/// Used wherever a region's byte range must be exhaustively consumed; a
/// trailing partial tag surfaces as [`WireError::TruncatedInput`].
pub fn read_tags(mut buf: Bytes) -> Result<Vec<Tag>, WireError> {
    let mut tags = Vec::new();
    while let Some(tag) = read_tag(&mut buf)? {
        tags.push(tag);
    }
    Ok(tags)
}
