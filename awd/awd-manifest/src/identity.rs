//! Identity block: provenance of a manifest file.

use awd_core::{AppleTimestamp, read_tags};
use bytes::Bytes;

use crate::error::ManifestError;
use crate::tags::{expect_scalar, expect_utf8};

const TAG_HASH: u64 = 0x01;
const TAG_NAME: u64 = 0x02;
const TAG_TIMESTAMP: u64 = 0x03;

/// Identity of a manifest: the SHA-1 of the generating source, the
/// source name, and when the file was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIdentity {
    /// SHA-1 digest, decoded from its hex-encoded ASCII wire form.
    pub hash: Option<Vec<u8>>,
    pub source_name: Option<String>,
    pub generated_at: Option<AppleTimestamp>,
}

impl ManifestIdentity {
    pub fn parse(data: Bytes) -> Result<Self, ManifestError> {
        let mut identity = Self {
            hash: None,
            source_name: None,
            generated_at: None,
        };
        for tag in read_tags(data)? {
            match tag.index {
                TAG_HASH => {
                    let text = expect_utf8(&tag, "identity hash")?;
                    let hash = hex::decode(text.trim())
                        .map_err(|source| ManifestError::BadIdentityHash { source })?;
                    identity.hash = Some(hash);
                }
                TAG_NAME => {
                    identity.source_name = Some(expect_utf8(&tag, "identity source name")?);
                }
                TAG_TIMESTAMP => {
                    identity.generated_at = Some(AppleTimestamp(expect_scalar(&tag)?));
                }
                index => return Err(ManifestError::UnknownIdentityTag { index }),
            }
        }
        Ok(identity)
    }
}
