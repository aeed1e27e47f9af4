//! Extension-points region: named extension anchors per category.

use std::collections::BTreeMap;

use awd_core::{CompositeTag, read_tags};
use bytes::Bytes;

use crate::error::ManifestError;
use crate::tags::{expect_opaque, expect_scalar, expect_utf8};

const EXTEND_POINT: u64 = 0x01;
const POINT_NAME: u64 = 0x01;
const POINT_TARGET: u64 = 0x02;

/// Decode the extension-points payload into `name → owning composite tag`.
///
/// The target value uses the composite-tag packing as its wire encoding:
/// it names which category the extension point belongs to.
pub fn parse_extension_points(
    data: Bytes,
) -> Result<BTreeMap<String, CompositeTag>, ManifestError> {
    let mut points = BTreeMap::new();
    for point in read_tags(data)? {
        if point.index != EXTEND_POINT {
            return Err(ManifestError::UnknownExtensionPointTag { index: point.index });
        }
        let mut name = None;
        let mut target = None;
        for tag in read_tags(expect_opaque(&point)?)? {
            match tag.index {
                POINT_NAME => name = Some(expect_utf8(&tag, "extension point name")?),
                POINT_TARGET => target = Some(CompositeTag::from_raw(expect_scalar(&tag)?)),
                index => return Err(ManifestError::UnknownExtensionPointTag { index }),
            }
        }
        if let (Some(name), Some(target)) = (name, target) {
            points.insert(name, target);
        }
    }
    Ok(points)
}
