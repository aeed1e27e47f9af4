//! Wire-level error taxonomy.

/// Errors produced by the varint and tag codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The stream ended in the middle of a value.
    #[error("input truncated mid-value")]
    TruncatedInput,

    /// A variable-length integer ran past the accepted byte bound.
    #[error("variable-length integer exceeds the 64-bit range")]
    IntegerOverflow,
}
