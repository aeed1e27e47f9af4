//! Schema definitions decoded from manifest tables.
//!
//! A table payload is an exhaustive tag stream of object and enum
//! definition rows; the row position (both kinds combined) is the
//! definition's local index within its category.

use awd_core::{CompositeTag, Tag, TagPayload, read_tags};
use bytes::Bytes;

use crate::error::ManifestError;
use crate::tags::{expect_opaque, expect_scalar, expect_utf8};

/// Top-level table row tags.
pub(crate) const DEFINE_OBJECT: u64 = 0x01;
pub(crate) const DEFINE_ENUM: u64 = 0x02;

// Object definition body.
const OBJECT_DISPLAY_NAME: u64 = 0x01;
const OBJECT_PROPERTY: u64 = 0x02;

// Enum definition body.
const ENUM_DISPLAY_NAME: u64 = 0x01;
const ENUM_MEMBER: u64 = 0x02;

// Enum member body.
const MEMBER_DISPLAY_NAME: u64 = 0x01;
const MEMBER_VALUE: u64 = 0x02;
const MEMBER_VALUE_SIGNED: u64 = 0x03;

// Property definition body.
const PROP_INDEX: u64 = 0x01;
const PROP_TYPE: u64 = 0x02;
const PROP_FLAGS: u64 = 0x03;
const PROP_DISPLAY_NAME: u64 = 0x04;
const PROP_SENSITIVITY: u64 = 0x05;
const PROP_STRING_FORMAT: u64 = 0x06;
const PROP_OBJECT_TYPE: u64 = 0x07;
const PROP_ENUM_TYPE: u64 = 0x08;
const PROP_INTEGER_FORMAT: u64 = 0x09;
const PROP_EXTENSION_KIND: u64 = 0x0a;
const PROP_EXTENSION_TARGET: u64 = 0x0b;
const PROP_EXTENSION_SCOPE: u64 = 0x0c;

// Inline named-type record (length-prefixed PROP_TYPE payload).
const NAMED_TYPE_CODE: u64 = 0x01;
const NAMED_TYPE_NAME: u64 = 0x02;

/// Semantic type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Unknown,
    Double,
    Float,
    Integer64,
    Integer,
    ErrorCode,
    Integer32,
    IntegerUnsigned,
    ByteCount,
    SequenceNumber,
    BedfOperator,
    Enum,
    Boolean,
    String,
    Bytes,
    PackedTimes,
    PackedErrors,
    PackedUint32,
    Object,
}

impl PropertyType {
    fn from_code(code: u64) -> Result<Self, ManifestError> {
        Ok(match code {
            0x00 => Self::Unknown,
            0x01 => Self::Double,
            0x02 => Self::Float,
            0x03 => Self::Integer64,
            0x04 => Self::Integer,
            0x05 => Self::ErrorCode,
            0x06 => Self::Integer32,
            0x07 => Self::IntegerUnsigned,
            0x08 => Self::ByteCount,
            0x09 => Self::SequenceNumber,
            0x0a => Self::BedfOperator,
            0x0b => Self::Enum,
            0x0c => Self::Boolean,
            0x0d => Self::String,
            0x0e => Self::Bytes,
            0x11 => Self::PackedTimes,
            0x14 => Self::PackedErrors,
            0x15 => Self::PackedUint32,
            0x1b => Self::Object,
            code => return Err(ManifestError::UnknownPropertyType { code }),
        })
    }
}

/// Display hint for integer-typed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerFormat {
    Timestamp,
    MetricId,
    TriggerId,
    ProfileId,
    ComponentId,
    AverageTime,
    TimeDelta,
    TimezoneOffset,
    AssociatedTime,
    PeriodInHours,
    TimeOfDay,
    SampleTimestamp,
}

impl IntegerFormat {
    fn from_code(code: u64) -> Result<Self, ManifestError> {
        Ok(match code {
            0x01 => Self::Timestamp,
            0x02 => Self::MetricId,
            0x03 => Self::TriggerId,
            0x04 => Self::ProfileId,
            0x05 => Self::ComponentId,
            0x15 => Self::AverageTime,
            0x16 => Self::TimeDelta,
            0x17 => Self::TimezoneOffset,
            0x18 => Self::AssociatedTime,
            0x19 => Self::PeriodInHours,
            0x1e => Self::TimeOfDay,
            0x1f => Self::SampleTimestamp,
            code => return Err(ManifestError::UnknownIntegerFormat { code }),
        })
    }

    /// True for formats that carry an absolute Apple-epoch time.
    pub fn is_timestamp(self) -> bool {
        matches!(self, Self::Timestamp | Self::SampleTimestamp)
    }
}

/// Display hint for string-typed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Unknown,
    Uuid,
}

impl StringFormat {
    fn from_code(code: u64) -> Result<Self, ManifestError> {
        Ok(match code {
            0x00 => Self::Unknown,
            0x01 => Self::Uuid,
            code => return Err(ManifestError::UnknownStringFormat { code }),
        })
    }
}

bitflags::bitflags! {
    /// Per-property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropertyFlags: u8 {
        const REPEATED = 0x01;
    }
}

/// How an extension property splices into its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    Add,
    Replace,
}

impl ExtensionKind {
    fn from_code(code: u64) -> Result<Option<Self>, ManifestError> {
        Ok(match code {
            0x00 => None,
            0x01 => Some(Self::Add),
            0x02 => Some(Self::Replace),
            code => return Err(ManifestError::UnknownExtensionKind { code }),
        })
    }
}

/// Which namespace an extension target is resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionScope {
    /// Target reference is an already-complete composite tag.
    Root,
    /// Target reference is local to the declaring category.
    Local,
    /// Target reference is an already-complete composite tag.
    Global,
    /// Target resolves against the ambient global-types list.
    Configuration,
}

impl ExtensionScope {
    fn from_code(code: u64) -> Result<Self, ManifestError> {
        Ok(match code {
            0x00 => Self::Root,
            0x01 => Self::Local,
            0x02 => Self::Global,
            0x03 => Self::Configuration,
            code => return Err(ManifestError::UnknownExtensionScope { code }),
        })
    }
}

/// A cross-definition reference: a raw integer from the wire until the
/// registry's bind pass completes it into a registry key. Never an
/// owning pointer — the registry owns all definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    /// As parsed; may be a partial (category-less) reference.
    Raw(u64),
    /// Completed and verified against the registry.
    Bound(CompositeTag),
    /// Lookup failed under the lenient policy; kept for diagnostics.
    Missing(u64),
}

impl TypeRef {
    pub fn bound(self) -> Option<CompositeTag> {
        match self {
            Self::Bound(tag) => Some(tag),
            _ => None,
        }
    }
}

/// One property row of an object definition.
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    pub local_index: u64,
    pub display_name: Option<String>,
    pub value_type: PropertyType,
    /// Secondary name carried by an inline named-type record.
    pub type_name: Option<String>,
    pub flags: PropertyFlags,
    /// Marks personally identifying content.
    pub sensitive: bool,
    pub integer_format: Option<IntegerFormat>,
    pub string_format: Option<StringFormat>,
    pub object_type: Option<TypeRef>,
    pub enum_type: Option<TypeRef>,
    pub extends: Option<TypeRef>,
    pub extension_scope: Option<ExtensionScope>,
    pub extension_kind: Option<ExtensionKind>,
}

impl PropertyDefinition {
    /// Blank property for hand-built schemas.
    pub fn new(local_index: u64, value_type: PropertyType) -> Self {
        Self {
            local_index,
            display_name: None,
            value_type,
            type_name: None,
            flags: PropertyFlags::empty(),
            sensitive: false,
            integer_format: None,
            string_format: None,
            object_type: None,
            enum_type: None,
            extends: None,
            extension_scope: None,
            extension_kind: None,
        }
    }

    /// True when this property declares extension semantics.
    pub fn is_extension(&self) -> bool {
        self.extends.is_some()
            || self.extension_scope.is_some()
            || self.extension_kind.is_some()
    }

    pub fn repeated(&self) -> bool {
        self.flags.contains(PropertyFlags::REPEATED)
    }

    /// Display name, or a positional placeholder for anonymous rows.
    pub fn name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => format!("#{}", self.local_index),
        }
    }

    pub(crate) fn parse(data: Bytes) -> Result<Self, ManifestError> {
        let mut prop = Self::new(0, PropertyType::Unknown);
        for tag in read_tags(data)? {
            match tag.index {
                PROP_INDEX => prop.local_index = expect_scalar(&tag)?,
                PROP_TYPE => match &tag.payload {
                    TagPayload::Scalar { value, .. } => {
                        prop.value_type = PropertyType::from_code(*value)?;
                    }
                    TagPayload::Opaque(body) => prop.parse_named_type(body.clone())?,
                },
                PROP_FLAGS => {
                    prop.flags = PropertyFlags::from_bits_truncate(expect_scalar(&tag)? as u8);
                }
                PROP_DISPLAY_NAME => {
                    prop.display_name = Some(expect_utf8(&tag, "property display name")?);
                }
                PROP_SENSITIVITY => {
                    prop.sensitive = match expect_scalar(&tag)? {
                        0 => false,
                        1 => true,
                        value => return Err(ManifestError::InvalidSensitivity { value }),
                    };
                }
                PROP_STRING_FORMAT => {
                    prop.string_format = Some(StringFormat::from_code(expect_scalar(&tag)?)?);
                }
                PROP_OBJECT_TYPE => prop.object_type = Some(TypeRef::Raw(expect_scalar(&tag)?)),
                PROP_ENUM_TYPE => prop.enum_type = Some(TypeRef::Raw(expect_scalar(&tag)?)),
                PROP_INTEGER_FORMAT => {
                    prop.integer_format = Some(IntegerFormat::from_code(expect_scalar(&tag)?)?);
                }
                PROP_EXTENSION_KIND => {
                    prop.extension_kind = ExtensionKind::from_code(expect_scalar(&tag)?)?;
                }
                PROP_EXTENSION_TARGET => prop.extends = Some(TypeRef::Raw(expect_scalar(&tag)?)),
                PROP_EXTENSION_SCOPE => {
                    prop.extension_scope = Some(ExtensionScope::from_code(expect_scalar(&tag)?)?);
                }
                index => return Err(ManifestError::UnknownPropertyTag { index }),
            }
        }
        Ok(prop)
    }

    fn parse_named_type(&mut self, body: Bytes) -> Result<(), ManifestError> {
        for tag in read_tags(body)? {
            match tag.index {
                NAMED_TYPE_CODE => self.value_type = PropertyType::from_code(expect_scalar(&tag)?)?,
                NAMED_TYPE_NAME => self.type_name = Some(expect_utf8(&tag, "named type")?),
                index => return Err(ManifestError::UnknownPropertyTag { index }),
            }
        }
        Ok(())
    }
}

/// An object (record) type definition.
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    tag: CompositeTag,
    pub display_name: Option<String>,
    /// Ordered property rows; extension splicing appends and removes here.
    pub properties: Vec<PropertyDefinition>,
}

impl ObjectDefinition {
    /// Empty definition for hand-built schemas.
    pub fn new(tag: CompositeTag) -> Self {
        Self {
            tag,
            display_name: None,
            properties: Vec::new(),
        }
    }

    pub fn composite_tag(&self) -> CompositeTag {
        self.tag
    }

    pub fn category(&self) -> u32 {
        self.tag.category()
    }

    /// Display name, or the composite tag for anonymous definitions.
    pub fn name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => self.tag.to_string(),
        }
    }

    /// First property matching a record tag index.
    pub fn property_by_index(&self, index: u64) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.local_index == index)
    }

    pub(crate) fn from_row(category: u32, row: u16, tag: &Tag) -> Result<Self, ManifestError> {
        Self::parse_body(CompositeTag::new(category, row), expect_opaque(tag)?)
    }

    /// Parse an object body (display name + property rows) at a known tag.
    pub fn parse_body(tag: CompositeTag, data: Bytes) -> Result<Self, ManifestError> {
        let mut def = Self::new(tag);
        for t in read_tags(data)? {
            match t.index {
                OBJECT_DISPLAY_NAME => {
                    def.display_name = Some(expect_utf8(&t, "object display name")?);
                }
                OBJECT_PROPERTY => def.properties.push(PropertyDefinition::parse(expect_opaque(&t)?)?),
                index => return Err(ManifestError::UnknownObjectTag { index }),
            }
        }
        Ok(def)
    }
}

/// Value carried by an enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValue {
    Unsigned(u64),
    /// Signed variant whose exact numeric encoding is an open decoding
    /// gap; the raw varint bytes are preserved alongside the wrapped
    /// 64-bit decode.
    SignedRaw { value: u64, raw: Bytes },
}

/// One member of an enum definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub display_name: Option<String>,
    pub value: Option<EnumValue>,
}

impl EnumMember {
    fn parse(data: Bytes) -> Result<Self, ManifestError> {
        let mut member = Self {
            display_name: None,
            value: None,
        };
        for tag in read_tags(data)? {
            match tag.index {
                // Observed as either a string or a bare number.
                MEMBER_DISPLAY_NAME => match &tag.payload {
                    TagPayload::Opaque(_) => {
                        member.display_name = Some(expect_utf8(&tag, "enum member name")?);
                    }
                    TagPayload::Scalar { value, .. } => {
                        member.display_name = Some(value.to_string());
                    }
                },
                MEMBER_VALUE => member.value = Some(EnumValue::Unsigned(expect_scalar(&tag)?)),
                MEMBER_VALUE_SIGNED => match &tag.payload {
                    TagPayload::Scalar { value, raw } => {
                        member.value = Some(EnumValue::SignedRaw {
                            value: *value,
                            raw: raw.clone(),
                        });
                    }
                    TagPayload::Opaque(_) => {
                        return Err(ManifestError::ExpectedScalar { index: tag.index });
                    }
                },
                index => return Err(ManifestError::UnknownEnumMemberTag { index }),
            }
        }
        Ok(member)
    }
}

/// An enumeration type definition.
#[derive(Debug, Clone)]
pub struct EnumDefinition {
    tag: CompositeTag,
    pub display_name: Option<String>,
    pub members: Vec<EnumMember>,
}

impl EnumDefinition {
    pub fn new(tag: CompositeTag) -> Self {
        Self {
            tag,
            display_name: None,
            members: Vec::new(),
        }
    }

    pub fn composite_tag(&self) -> CompositeTag {
        self.tag
    }

    /// Member label for a decoded record value.
    pub fn label_for(&self, value: u64) -> Option<&str> {
        self.members
            .iter()
            .find(|m| matches!(m.value, Some(EnumValue::Unsigned(v)) if v == value))
            .and_then(|m| m.display_name.as_deref())
    }

    pub(crate) fn from_row(category: u32, row: u16, tag: &Tag) -> Result<Self, ManifestError> {
        Self::parse_body(CompositeTag::new(category, row), expect_opaque(tag)?)
    }

    /// Parse an enum body (display name + member rows) at a known tag.
    pub fn parse_body(tag: CompositeTag, data: Bytes) -> Result<Self, ManifestError> {
        let mut def = Self::new(tag);
        for t in read_tags(data)? {
            match t.index {
                ENUM_DISPLAY_NAME => def.display_name = Some(expect_utf8(&t, "enum display name")?),
                ENUM_MEMBER => def.members.push(EnumMember::parse(expect_opaque(&t)?)?),
                index => return Err(ManifestError::UnknownEnumTag { index }),
            }
        }
        Ok(def)
    }
}

/// A single table row: either an object or an enum definition.
#[derive(Debug, Clone)]
pub enum Definition {
    Object(ObjectDefinition),
    Enum(EnumDefinition),
}

impl Definition {
    pub fn composite_tag(&self) -> CompositeTag {
        match self {
            Self::Object(def) => def.composite_tag(),
            Self::Enum(def) => def.composite_tag(),
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Object(def) => def.display_name.as_deref(),
            Self::Enum(def) => def.display_name.as_deref(),
        }
    }
}
