//! Error types for manifest parsing.

use awd_core::WireError;

use crate::container::RegionKind;

/// Errors produced while parsing a manifest container or its regions.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The file does not start with the manifest magic constant.
    #[error("bad magic: expected \"AWDM\", got {found:02x?}")]
    BadMagic { found: [u8; 4] },

    /// The container version is not the supported (1, 1).
    #[error("unsupported manifest version {major}.{minor} (supported: 1.1)")]
    UnsupportedVersion { major: u16, minor: u16 },

    /// The fixed header ended before the sentinel entry.
    #[error("manifest header truncated at byte {offset}")]
    TruncatedHeader { offset: usize },

    /// A header entry names a region kind outside the known set.
    #[error("unknown region kind {kind:#x} at byte {offset}")]
    UnknownRegionKind { kind: u16, offset: usize },

    /// A header entry's field count does not match its region kind.
    #[error("region kind {kind:#x} carries {count} header fields, expected {expected}")]
    FieldCountMismatch { kind: u16, count: u16, expected: u16 },

    /// A region window runs past the end of the file.
    #[error("{kind:?} region at {offset:#x}+{size:#x} overruns the file ({file_len} bytes)")]
    RegionOutOfBounds {
        kind: RegionKind,
        offset: u32,
        size: u32,
        file_len: usize,
    },

    /// Structure and display tables disagree on category tags.
    #[error("structure tables {structure:x?} and display tables {display:x?} disagree on categories")]
    CategoryMismatch {
        structure: Vec<u32>,
        display: Vec<u32>,
    },

    /// An extension manifest defined more than one category.
    #[error("extension manifest defines {count} categories, expected at most one")]
    TooManyCategories { count: usize },

    /// A table row carries a tag index that is neither an object nor an
    /// enum definition.
    #[error("unknown definition tag {index} in table row")]
    UnknownDefinitionTag { index: u64 },

    #[error("unknown tag {index} in object definition")]
    UnknownObjectTag { index: u64 },

    /// Unknown property field — likely a newer schema revision this
    /// parser cannot safely interpret.
    #[error("unknown tag {index} in property definition")]
    UnknownPropertyTag { index: u64 },

    #[error("unknown tag {index} in enum definition")]
    UnknownEnumTag { index: u64 },

    #[error("unknown tag {index} in enum member")]
    UnknownEnumMemberTag { index: u64 },

    #[error("unknown tag {index} in identity block")]
    UnknownIdentityTag { index: u64 },

    #[error("unknown tag {index} in extension point")]
    UnknownExtensionPointTag { index: u64 },

    #[error("unknown property type code {code:#x}")]
    UnknownPropertyType { code: u64 },

    #[error("unknown integer format {code:#x}")]
    UnknownIntegerFormat { code: u64 },

    #[error("unknown string format {code:#x}")]
    UnknownStringFormat { code: u64 },

    #[error("unknown extension scope {code:#x}")]
    UnknownExtensionScope { code: u64 },

    #[error("unknown extension operation {code:#x}")]
    UnknownExtensionKind { code: u64 },

    #[error("sensitivity flag must be 0 or 1, got {value}")]
    InvalidSensitivity { value: u64 },

    /// A tag that must carry a length-prefixed payload carried a scalar.
    #[error("expected a length-prefixed payload for tag {index}")]
    ExpectedPayload { index: u64 },

    /// A tag that must carry a scalar carried a payload.
    #[error("expected a scalar value for tag {index}")]
    ExpectedScalar { index: u64 },

    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// The identity hash field is not hex-encoded ASCII.
    #[error("identity hash is not hex-encoded: {source}")]
    BadIdentityHash {
        #[source]
        source: hex::FromHexError,
    },

    #[error(transparent)]
    Wire(#[from] WireError),
}
