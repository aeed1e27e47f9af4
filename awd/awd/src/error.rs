//! Error surface of the facade loader.

use awd_core::CompositeTag;
use awd_manifest::ManifestError;
use awd_registry::RegistryError;

use crate::record::RecordError;

/// Errors produced by [`MetadataLoader`](crate::MetadataLoader) and
/// [`Metadata`](crate::Metadata).
#[derive(Debug, thiserror::Error)]
pub enum AwdError {
    /// I/O error while opening or memory-mapping a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A manifest file failed to parse.
    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: String,
        #[source]
        source: ManifestError,
    },

    /// A parsed manifest could not be merged into the registry.
    #[error("failed to load manifest {path}: {source}")]
    ManifestLoad {
        path: String,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Record(#[from] RecordError),

    /// No object definition exists at the requested tag.
    #[error("no object definition at {tag}")]
    UnknownObject { tag: CompositeTag },
}
