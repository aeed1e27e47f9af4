//! Schema-driven decoding of AWD telemetry.
//!
//! The pipeline runs strictly upward: raw bytes → tags → definitions →
//! bound registry → decoded record tree.
//!
//! - [`MetadataLoader`] reads a root manifest plus extension manifests
//!   into a resolved [`SchemaRegistry`](awd_registry::SchemaRegistry)
//! - [`Metadata::decode_record`] walks a raw record against the
//!   registry, producing a [`DiagnosticObject`] tree
//! - [`render_text`] prints a decoded tree as an indented listing
//!
//! Callers composing a registry from in-memory byte sources can skip the
//! loader and drive [`awd_manifest::Manifest::parse`] plus
//! [`awd_registry::SchemaRegistry`] directly; nothing here depends on
//! filesystem layout.

mod bootstrap;
mod error;
mod reader;
mod record;
mod text;

pub use awd_core as core;
pub use awd_manifest as manifest;
pub use awd_registry as registry;

pub use bootstrap::root_object;
pub use error::AwdError;
pub use reader::{Metadata, MetadataLoader};
pub use record::{DiagnosticObject, DiagnosticPayload, DiagnosticValue, RecordError, decode_record};
pub use text::render_text;
