//! Registry-wide definition addressing.

use std::fmt;

/// Process-wide unique identifier of a schema definition:
/// `(category << 16) | local_index`.
///
/// `category` is the owning manifest table's tag and `local_index` the
/// definition's row position within that table. The same packing is used
/// on the wire inside the extension-points region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeTag(u64);

impl CompositeTag {
    /// The well-known root record object.
    pub const ROOT_OBJECT: CompositeTag = CompositeTag(0x01);

    pub const fn new(category: u32, local_index: u16) -> Self {
        CompositeTag(((category as u64) << 16) | local_index as u64)
    }

    /// Reinterpret an already-complete composite value from the wire.
    pub const fn from_raw(raw: u64) -> Self {
        CompositeTag(raw)
    }

    /// Complete a possibly-partial wire reference: values that fit in the
    /// local-index width are qualified with `category`, wider values are
    /// taken as already complete.
    pub const fn complete(category: u32, raw: u64) -> Self {
        if raw <= u16::MAX as u64 {
            Self::new(category, raw as u16)
        } else {
            Self::from_raw(raw)
        }
    }

    pub const fn category(self) -> u32 {
        (self.0 >> 16) as u32
    }

    pub const fn local_index(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CompositeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
