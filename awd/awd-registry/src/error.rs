//! Error types for registry loading and resolution.

use awd_core::CompositeTag;
use awd_manifest::ManifestError;

use crate::registry::ResolutionState;

/// Errors produced by [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A phase method was called out of order.
    #[error("registry is {actual}, operation requires {expected}")]
    InvalidState {
        expected: ResolutionState,
        actual: ResolutionState,
    },

    /// Two definitions claimed the same composite tag.
    #[error("duplicate definition {tag}")]
    DuplicateDefinition { tag: CompositeTag },

    /// A reference lookup missed under the strict policy.
    #[error("unresolved {field} reference {target} on {tag}")]
    UnresolvedReference {
        tag: CompositeTag,
        field: &'static str,
        target: CompositeTag,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}
