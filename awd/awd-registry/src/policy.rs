/// Policy for reference lookups that miss during the bind pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// Record the miss, log it, and keep resolving the rest of the
    /// registry (default). Device registries are routinely incomplete
    /// relative to the manifests that produced a reference.
    #[default]
    Lenient,
    /// Fail the bind pass on the first dangling reference.
    Strict,
}
