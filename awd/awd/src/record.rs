//! Schema-driven record decoding.
//!
//! A record is an exhaustive tag stream interpreted against an object
//! definition: each tag matches a property by local index, OBJECT-typed
//! properties recurse into their nested payload, and every other type
//! yields a scalar [`Value`] typed by the property's metadata.

use std::sync::Arc;

use awd_core::{AppleTimestamp, Tag, Value, WireError, read_tags, read_varint};
use bytes::Bytes;

use awd_manifest::{ObjectDefinition, PropertyDefinition, PropertyType, TypeRef};
use awd_registry::SchemaRegistry;

/// Errors from decoding a record against a schema.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A known property's wire kind contradicts its declared type.
    #[error("property {property} carries a {found} payload, expected {expected}")]
    PayloadMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An OBJECT-typed property whose object type never resolved.
    #[error("property {property} has no bound object type")]
    UnboundObjectType { property: String },

    #[error("invalid UTF-8 in string property {property}")]
    InvalidUtf8 { property: String },
}

/// A decoded record: the schema it was decoded against plus its fields
/// in record order.
///
/// Schema and property references borrow from the registry; the decoded
/// tree never owns definitions.
#[derive(Debug)]
pub struct DiagnosticObject<'reg> {
    pub schema: &'reg ObjectDefinition,
    pub values: Vec<DiagnosticValue<'reg>>,
}

impl<'reg> DiagnosticObject<'reg> {
    /// First decoded field matching a property display name.
    pub fn value_named(&self, name: &str) -> Option<&DiagnosticValue<'reg>> {
        self.values
            .iter()
            .find(|v| v.property.is_some_and(|p| p.display_name.as_deref() == Some(name)))
    }
}

/// One decoded field.
#[derive(Debug)]
pub struct DiagnosticValue<'reg> {
    /// Matched property; `None` for fields the registry does not know.
    pub property: Option<&'reg PropertyDefinition>,
    pub payload: DiagnosticPayload<'reg>,
}

/// Payload of a decoded field.
#[derive(Debug)]
pub enum DiagnosticPayload<'reg> {
    Scalar(Value),
    Object(DiagnosticObject<'reg>),
    /// A tag with no matching property, retained verbatim: the record
    /// may come from a newer schema than the registry holds.
    Unknown(Tag),
}

/// Decode `data` exhaustively against `schema`, recursing into
/// OBJECT-typed properties via the registry.
pub fn decode_record<'reg>(
    registry: &'reg SchemaRegistry,
    schema: &'reg ObjectDefinition,
    data: Bytes,
) -> Result<DiagnosticObject<'reg>, RecordError> {
    let mut values = Vec::new();
    for tag in read_tags(data)? {
        values.push(decode_field(registry, schema, tag)?);
    }
    Ok(DiagnosticObject { schema, values })
}

fn decode_field<'reg>(
    registry: &'reg SchemaRegistry,
    schema: &'reg ObjectDefinition,
    tag: Tag,
) -> Result<DiagnosticValue<'reg>, RecordError> {
    let Some(property) = schema.property_by_index(tag.index) else {
        return Ok(DiagnosticValue {
            property: None,
            payload: DiagnosticPayload::Unknown(tag),
        });
    };

    let payload = if property.value_type == PropertyType::Object {
        let body = expect_payload(property, &tag)?;
        let nested = property
            .object_type
            .and_then(TypeRef::bound)
            .and_then(|target| registry.object(target))
            .ok_or_else(|| RecordError::UnboundObjectType {
                property: property.name(),
            })?;
        DiagnosticPayload::Object(decode_record(registry, nested, body)?)
    } else {
        DiagnosticPayload::Scalar(scalar_value(registry, property, &tag)?)
    };

    Ok(DiagnosticValue {
        property: Some(property),
        payload,
    })
}

/// Apply the property's declared type and format hints to one tag.
fn scalar_value(
    registry: &SchemaRegistry,
    property: &PropertyDefinition,
    tag: &Tag,
) -> Result<Value, RecordError> {
    Ok(match property.value_type {
        PropertyType::String => {
            let body = expect_payload(property, tag)?;
            let text = std::str::from_utf8(&body).map_err(|_| RecordError::InvalidUtf8 {
                property: property.name(),
            })?;
            Value::String(Arc::from(text))
        }
        PropertyType::Bytes => Value::bytes(expect_payload(property, tag)?),
        PropertyType::PackedTimes | PropertyType::PackedErrors | PropertyType::PackedUint32 => {
            let mut body = expect_payload(property, tag)?;
            let mut packed = Vec::new();
            while let Some(v) = read_varint(&mut body)? {
                packed.push(v.value);
            }
            Value::Packed(packed)
        }
        PropertyType::Boolean => Value::Bool(expect_scalar(property, tag)? != 0),
        PropertyType::Double => Value::F64(f64::from_bits(expect_scalar(property, tag)?)),
        PropertyType::Float => Value::F32(f32::from_bits(expect_scalar(property, tag)? as u32)),
        PropertyType::Integer64 => Value::Signed(expect_scalar(property, tag)? as i64),
        PropertyType::Integer32 => {
            Value::Signed(i64::from(expect_scalar(property, tag)? as u32 as i32))
        }
        PropertyType::Enum => {
            let value = expect_scalar(property, tag)?;
            let label = property
                .enum_type
                .and_then(TypeRef::bound)
                .and_then(|target| registry.enumeration(target))
                .and_then(|en| en.label_for(value))
                .map(Arc::from);
            Value::Enum { value, label }
        }
        PropertyType::Object => return Err(payload_mismatch(property, tag)),
        PropertyType::Unknown
        | PropertyType::Integer
        | PropertyType::ErrorCode
        | PropertyType::IntegerUnsigned
        | PropertyType::ByteCount
        | PropertyType::SequenceNumber
        | PropertyType::BedfOperator => {
            let value = expect_scalar(property, tag)?;
            if property.integer_format.is_some_and(|f| f.is_timestamp()) {
                Value::Timestamp(AppleTimestamp(value))
            } else {
                Value::Unsigned(value)
            }
        }
    })
}

fn expect_scalar(property: &PropertyDefinition, tag: &Tag) -> Result<u64, RecordError> {
    tag.scalar().ok_or_else(|| payload_mismatch(property, tag))
}

fn expect_payload(property: &PropertyDefinition, tag: &Tag) -> Result<Bytes, RecordError> {
    tag.opaque()
        .cloned()
        .ok_or_else(|| payload_mismatch(property, tag))
}

fn payload_mismatch(property: &PropertyDefinition, tag: &Tag) -> RecordError {
    let (expected, found) = match tag.opaque() {
        Some(_) => ("scalar", "length-prefixed"),
        None => ("length-prefixed", "scalar"),
    };
    RecordError::PayloadMismatch {
        property: property.name(),
        expected,
        found,
    }
}
