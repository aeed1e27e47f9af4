//! The format's variable-length integer primitive.

use bytes::{Buf, Bytes};

use crate::error::WireError;

/// Longest accepted encoding, matching the 64-bit value range.
pub const MAX_VARINT_LEN: usize = 10;

/// A decoded variable-length integer and the number of bytes it occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt {
    pub value: u64,
    pub byte_length: usize,
}

/// Decode one variable-length integer from the front of `buf`.
///
/// The encoding is continuation-bit-terminated base-128 with reversed
/// byte significance: the running total is shifted left before each new
/// byte's low seven bits are OR-ed in, so the terminating byte lands in
/// the low bits of the final value.
///
/// Returns `Ok(None)` when `buf` is empty (clean EOF). Returns
/// [`WireError::TruncatedInput`] when at least one continuation byte was
/// consumed but the stream ended before a terminating byte, and
/// [`WireError::IntegerOverflow`] past [`MAX_VARINT_LEN`] bytes. Within
/// that bound the accumulator wraps; the one producer known to emit
/// wider-than-64-bit scalars is handled by preserving the raw span at
/// the tag layer.
pub fn read_varint(buf: &mut Bytes) -> Result<Option<VarInt>, WireError> {
    if buf.is_empty() {
        return Ok(None);
    }

    let mut value: u64 = 0;
    let mut byte_length = 0usize;
    loop {
        if byte_length == MAX_VARINT_LEN {
            return Err(WireError::IntegerOverflow);
        }
        if !buf.has_remaining() {
            return Err(WireError::TruncatedInput);
        }
        let byte = buf.get_u8();
        byte_length += 1;
        value = value.wrapping_shl(7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(Some(VarInt { value, byte_length }));
        }
    }
}
