//! Typed scalars produced by schema-driven record decoding.

use std::fmt;
use std::sync::Arc;

use crate::timestamp::AppleTimestamp;

/// Value produced by the record decoder once a property's declared type
/// and format hints have been applied. Variants are explicit; no lossy
/// conversions happen after decode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    Bytes(Arc<[u8]>),
    Timestamp(AppleTimestamp),
    /// Enum-typed field: the raw value plus the member label when the
    /// enum definition resolved.
    Enum { value: u64, label: Option<Arc<str>> },
    /// Packed run of varints (packed u32 / times / errors).
    Packed(Vec<u64>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    pub fn bytes(data: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Arc::from(data.as_ref()))
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Signed(_) => "Signed",
            Value::Unsigned(_) => "Unsigned",
            Value::F32(_) => "F32",
            Value::F64(_) => "F64",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Timestamp(_) => "Timestamp",
            Value::Enum { .. } => "Enum",
            Value::Packed(_) => "Packed",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Signed(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Enum { value, label } => match label {
                Some(label) => write!(f, "{label} ({value})"),
                None => write!(f, "{value}"),
            },
            Value::Packed(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}
