//! Manifest container: fixed header, typed regions, lazy byte windows.

use std::collections::BTreeMap;

use awd_core::CompositeTag;
use bytes::{Buf, Bytes};

use crate::definition::{DEFINE_ENUM, DEFINE_OBJECT, Definition, EnumDefinition, ObjectDefinition};
use crate::error::ManifestError;
use crate::extension_points::parse_extension_points;
use crate::identity::ManifestIdentity;

/// Magic constant at the start of every manifest file.
pub const MANIFEST_MAGIC: [u8; 4] = *b"AWDM";

/// The only supported container version.
pub const SUPPORTED_VERSION: (u16, u16) = (1, 1);

/// Region kinds named by container header entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// Compact definition table.
    Structure,
    /// Definition table carrying display metadata.
    Display,
    /// Hash, source name, and generation timestamp of the file.
    Identity,
    /// Properties the file contributes to the root record object.
    GlobalTypes,
    /// Named extension points and their owning categories.
    ExtensionPoints,
}

impl RegionKind {
    fn from_u16(kind: u16) -> Option<Self> {
        Some(match kind {
            2 => Self::Structure,
            3 => Self::Display,
            4 => Self::Identity,
            5 => Self::GlobalTypes,
            6 => Self::ExtensionPoints,
            _ => return None,
        })
    }
}

/// A lazily-read byte window into the owning file. Header parsing only
/// records the window; region content is decoded on demand.
#[derive(Debug, Clone)]
pub struct ManifestRegion {
    pub kind: RegionKind,
    pub offset: u32,
    pub size: u32,
    data: Bytes,
}

impl ManifestRegion {
    /// The region's raw bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }
}

/// A structure or display table: a tagged, checksummed region of
/// definition rows.
#[derive(Debug, Clone)]
pub struct ManifestTable {
    pub region: ManifestRegion,
    /// Category tag shared by every definition in the table.
    pub category: u32,
    /// Carried but never verified.
    pub checksum: u32,
}

impl ManifestTable {
    /// Decode the table payload into definition rows. Row position
    /// (objects and enums combined) is the definition's local index.
    pub fn parse(&self) -> Result<Vec<Definition>, ManifestError> {
        let tags = awd_core::read_tags(self.region.bytes())?;
        let mut rows = Vec::with_capacity(tags.len());
        for (row, tag) in tags.iter().enumerate() {
            let def = match tag.index {
                DEFINE_OBJECT => {
                    Definition::Object(ObjectDefinition::from_row(self.category, row as u16, tag)?)
                }
                DEFINE_ENUM => {
                    Definition::Enum(EnumDefinition::from_row(self.category, row as u16, tag)?)
                }
                index => return Err(ManifestError::UnknownDefinitionTag { index }),
            };
            rows.push(def);
        }
        Ok(rows)
    }
}

/// A parsed manifest container.
///
/// Only the fixed header is read eagerly; tables, identity, global
/// types, and extension points parse on demand from their byte windows,
/// in any order.
#[derive(Debug)]
pub struct Manifest {
    is_root: bool,
    structure_tables: BTreeMap<u32, ManifestTable>,
    display_tables: BTreeMap<u32, ManifestTable>,
    identity: Option<ManifestRegion>,
    global_types: Option<ManifestRegion>,
    extension_points: Option<ManifestRegion>,
}

impl Manifest {
    /// Parse the container header of `data` and record region windows.
    pub fn parse(data: Bytes) -> Result<Self, ManifestError> {
        let mut buf = data.clone();
        if buf.remaining() < 12 {
            return Err(ManifestError::TruncatedHeader { offset: data.len() });
        }

        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        if magic != MANIFEST_MAGIC {
            return Err(ManifestError::BadMagic { found: magic });
        }
        let major = buf.get_u16_le();
        let minor = buf.get_u16_le();
        if (major, minor) != SUPPORTED_VERSION {
            return Err(ManifestError::UnsupportedVersion { major, minor });
        }

        // The four bytes after the version are the section count on a
        // root manifest and the first region entry on an extension
        // manifest; a zero value distinguishes the two.
        let probe = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let is_root = probe == 0;
        if is_root {
            buf.advance(4);
        }

        let mut manifest = Manifest {
            is_root,
            structure_tables: BTreeMap::new(),
            display_tables: BTreeMap::new(),
            identity: None,
            global_types: None,
            extension_points: None,
        };

        loop {
            let offset = data.len() - buf.remaining();
            if buf.remaining() < 4 {
                return Err(ManifestError::TruncatedHeader { offset });
            }
            let kind_raw = buf.get_u16_le();
            let field_count = buf.get_u16_le();
            if kind_raw == 0 && field_count == 0 {
                break;
            }

            let kind = RegionKind::from_u16(kind_raw).ok_or(ManifestError::UnknownRegionKind {
                kind: kind_raw,
                offset,
            })?;

            match kind {
                RegionKind::Structure | RegionKind::Display => {
                    if field_count != 4 {
                        return Err(ManifestError::FieldCountMismatch {
                            kind: kind_raw,
                            count: field_count,
                            expected: 4,
                        });
                    }
                    if buf.remaining() < 16 {
                        return Err(ManifestError::TruncatedHeader { offset });
                    }
                    let category = buf.get_u32_le();
                    let region_offset = buf.get_u32_le();
                    let size = buf.get_u32_le();
                    let checksum = buf.get_u32_le();
                    let table = ManifestTable {
                        region: Self::region(&data, kind, region_offset, size)?,
                        category,
                        checksum,
                    };
                    match kind {
                        RegionKind::Structure => {
                            manifest.structure_tables.insert(category, table);
                        }
                        _ => {
                            manifest.display_tables.insert(category, table);
                        }
                    }
                }
                RegionKind::Identity | RegionKind::GlobalTypes | RegionKind::ExtensionPoints => {
                    if field_count != 2 {
                        return Err(ManifestError::FieldCountMismatch {
                            kind: kind_raw,
                            count: field_count,
                            expected: 2,
                        });
                    }
                    if buf.remaining() < 8 {
                        return Err(ManifestError::TruncatedHeader { offset });
                    }
                    let region_offset = buf.get_u32_le();
                    let size = buf.get_u32_le();
                    let region = Self::region(&data, kind, region_offset, size)?;
                    match kind {
                        RegionKind::Identity => manifest.identity = Some(region),
                        RegionKind::GlobalTypes => manifest.global_types = Some(region),
                        _ => manifest.extension_points = Some(region),
                    }
                }
            }
        }

        manifest.validate()?;
        Ok(manifest)
    }

    fn region(
        data: &Bytes,
        kind: RegionKind,
        offset: u32,
        size: u32,
    ) -> Result<ManifestRegion, ManifestError> {
        let start = offset as usize;
        let end = start
            .checked_add(size as usize)
            .filter(|&end| end <= data.len())
            .ok_or(ManifestError::RegionOutOfBounds {
                kind,
                offset,
                size,
                file_len: data.len(),
            })?;
        Ok(ManifestRegion {
            kind,
            offset,
            size,
            data: data.slice(start..end),
        })
    }

    fn validate(&self) -> Result<(), ManifestError> {
        let structure: Vec<u32> = self.structure_tables.keys().copied().collect();
        let display: Vec<u32> = self.display_tables.keys().copied().collect();
        // Extension manifests have been observed without a display side;
        // the category sets must agree whenever both are present.
        if !structure.is_empty() && !display.is_empty() && structure != display {
            return Err(ManifestError::CategoryMismatch { structure, display });
        }
        let count = self.categories().len();
        if !self.is_root && count > 1 {
            return Err(ManifestError::TooManyCategories { count });
        }
        Ok(())
    }

    /// True when the file defines many categories at once.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Category tags defined by this file, in ascending order.
    pub fn categories(&self) -> Vec<u32> {
        let mut categories: Vec<u32> = self.structure_tables.keys().copied().collect();
        for category in self.display_tables.keys() {
            if !categories.contains(category) {
                categories.push(*category);
            }
        }
        categories.sort_unstable();
        categories
    }

    /// The single category of an extension manifest.
    pub fn category(&self) -> Option<u32> {
        if self.is_root {
            None
        } else {
            self.categories().first().copied()
        }
    }

    pub fn structure_tables(&self) -> &BTreeMap<u32, ManifestTable> {
        &self.structure_tables
    }

    pub fn display_tables(&self) -> &BTreeMap<u32, ManifestTable> {
        &self.display_tables
    }

    pub fn identity_region(&self) -> Option<&ManifestRegion> {
        self.identity.as_ref()
    }

    pub fn global_types_region(&self) -> Option<&ManifestRegion> {
        self.global_types.as_ref()
    }

    pub fn extension_points_region(&self) -> Option<&ManifestRegion> {
        self.extension_points.as_ref()
    }

    /// Decode the identity block, if the file carries one.
    pub fn identity(&self) -> Result<Option<ManifestIdentity>, ManifestError> {
        self.identity
            .as_ref()
            .map(|region| ManifestIdentity::parse(region.bytes()))
            .transpose()
    }

    /// Decode the global-types region, if present: one object-definition
    /// body holding the properties this file contributes to the root
    /// record object.
    pub fn global_types(&self) -> Result<Option<ObjectDefinition>, ManifestError> {
        let Some(region) = &self.global_types else {
            return Ok(None);
        };
        let tag = match self.category() {
            Some(category) => CompositeTag::new(category, 0),
            None => CompositeTag::ROOT_OBJECT,
        };
        ObjectDefinition::parse_body(tag, region.bytes()).map(Some)
    }

    /// Decode the extension-points region, if present.
    pub fn extension_points(
        &self,
    ) -> Result<Option<BTreeMap<String, CompositeTag>>, ManifestError> {
        self.extension_points
            .as_ref()
            .map(|region| parse_extension_points(region.bytes()))
            .transpose()
    }

    /// Eagerly parse every region, validating the whole file.
    ///
    /// Loading normally decodes regions on demand; callers that want to
    /// reject a malformed file up front (before any registry mutation)
    /// use this.
    pub fn parse_all(&self) -> Result<(), ManifestError> {
        for table in self.structure_tables.values().chain(self.display_tables.values()) {
            table.parse()?;
        }
        self.identity()?;
        self.global_types()?;
        self.extension_points()?;
        Ok(())
    }
}
