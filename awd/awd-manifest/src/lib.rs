//! Manifest container parsing for the AWD telemetry format.
//!
//! A manifest is a binary file that self-describes a schema of object
//! and enum definitions for one or more categories. This crate parses
//! the fixed container header into lazily-read regions and decodes the
//! TLV content of each region:
//!
//! - [`Manifest`] — header, typed regions, root/extension mode
//! - [`ObjectDefinition`] / [`EnumDefinition`] — schema definition rows
//! - [`ManifestIdentity`] — provenance block (hash, source, timestamp)
//!
//! Cross-definition references stay raw integers ([`TypeRef::Raw`]) here;
//! the registry crate's bind pass completes them.

mod container;
mod definition;
mod error;
mod extension_points;
mod identity;
mod tags;

pub use container::{
    MANIFEST_MAGIC, Manifest, ManifestRegion, ManifestTable, RegionKind, SUPPORTED_VERSION,
};
pub use definition::{
    Definition, EnumDefinition, EnumMember, EnumValue, ExtensionKind, ExtensionScope,
    IntegerFormat, ObjectDefinition, PropertyDefinition, PropertyFlags, PropertyType, StringFormat,
    TypeRef,
};
pub use error::ManifestError;
pub use extension_points::parse_extension_points;
pub use identity::ManifestIdentity;
