//! Small shared accessors for tag payload shapes.

use awd_core::Tag;
use bytes::Bytes;

use crate::error::ManifestError;

pub(crate) fn expect_scalar(tag: &Tag) -> Result<u64, ManifestError> {
    tag.scalar()
        .ok_or(ManifestError::ExpectedScalar { index: tag.index })
}

pub(crate) fn expect_opaque(tag: &Tag) -> Result<Bytes, ManifestError> {
    tag.opaque()
        .cloned()
        .ok_or(ManifestError::ExpectedPayload { index: tag.index })
}

pub(crate) fn expect_utf8(tag: &Tag, context: &'static str) -> Result<String, ManifestError> {
    let data = expect_opaque(tag)?;
    std::str::from_utf8(&data)
        .map(str::to_owned)
        .map_err(|_| ManifestError::InvalidUtf8 { context })
}
