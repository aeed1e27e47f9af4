//! File-backed metadata loading and the decode entry points.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;
use rayon::prelude::*;
use tracing::{debug, warn};

use awd_core::CompositeTag;
use awd_manifest::Manifest;
use awd_registry::{ReferencePolicy, SchemaRegistry};

use crate::bootstrap;
use crate::error::AwdError;
use crate::record::{self, DiagnosticObject};

/// Loads a root manifest plus extension manifests into a resolved
/// [`SchemaRegistry`].
///
/// Path discovery belongs to the caller; the loader only reads the
/// paths it is given.
pub struct MetadataLoader {
    policy: ReferencePolicy,
    fail_on_bad_extension: bool,
    root: PathBuf,
    extensions: Vec<PathBuf>,
}

impl MetadataLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            policy: ReferencePolicy::default(),
            fail_on_bad_extension: false,
            root: root.into(),
            extensions: Vec::new(),
        }
    }

    /// Reference-resolution policy for the bind pass.
    pub fn policy(mut self, policy: ReferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Treat a malformed extension manifest as fatal instead of
    /// skipping it with a warning.
    pub fn fail_on_bad_extension(mut self, fail: bool) -> Self {
        self.fail_on_bad_extension = fail;
        self
    }

    pub fn extension(mut self, path: impl Into<PathBuf>) -> Self {
        self.extensions.push(path.into());
        self
    }

    pub fn extensions<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.extensions.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Read and parse every file, then run the serialized registry
    /// merge.
    ///
    /// Independent files parse in parallel; the merge itself is
    /// single-writer and runs root-first. A bad root manifest is fatal.
    pub fn load(self) -> Result<Metadata, AwdError> {
        let root = parse_file(&self.root)?;

        let parsed: Vec<(PathBuf, Result<Manifest, AwdError>)> = self
            .extensions
            .par_iter()
            .map(|path| (path.clone(), parse_file(path)))
            .collect();

        let mut registry = SchemaRegistry::new(self.policy);
        registry.install_root_object(bootstrap::root_object())?;
        registry
            .load_manifest(&root)
            .map_err(|source| AwdError::ManifestLoad {
                path: self.root.display().to_string(),
                source,
            })?;

        for (path, manifest) in parsed {
            match manifest {
                Ok(manifest) => {
                    debug!(path = %path.display(), "loading extension manifest");
                    registry
                        .load_manifest(&manifest)
                        .map_err(|source| AwdError::ManifestLoad {
                            path: path.display().to_string(),
                            source,
                        })?;
                }
                Err(error) if self.fail_on_bad_extension => return Err(error),
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping extension manifest");
                }
            }
        }

        registry.bind()?;
        registry.extend()?;
        Ok(Metadata { registry })
    }
}

/// Memory-map and parse one manifest file, validating every region
/// before any registry state is touched.
fn parse_file(path: &Path) -> Result<Manifest, AwdError> {
    let file = fs::File::open(path)?;
    let mmap = unsafe { Mmap::map(&file) }?;
    let manifest = Manifest::parse(Bytes::copy_from_slice(&mmap)).map_err(|source| {
        AwdError::ManifestParse {
            path: path.display().to_string(),
            source,
        }
    })?;
    manifest.parse_all().map_err(|source| AwdError::ManifestParse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(manifest)
}

/// A fully resolved registry plus record-decoding entry points.
///
/// Built once and shared read-only by any number of concurrent decodes.
pub struct Metadata {
    registry: SchemaRegistry,
}

impl Metadata {
    /// Wrap an already-resolved registry.
    pub fn from_registry(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Decode a record against the root record schema.
    pub fn decode_record(&self, data: Bytes) -> Result<DiagnosticObject<'_>, AwdError> {
        self.decode_record_as(CompositeTag::ROOT_OBJECT, data)
    }

    /// Decode a record against an explicit object schema.
    pub fn decode_record_as(
        &self,
        tag: CompositeTag,
        data: Bytes,
    ) -> Result<DiagnosticObject<'_>, AwdError> {
        let schema = self
            .registry
            .object(tag)
            .ok_or(AwdError::UnknownObject { tag })?;
        Ok(record::decode_record(&self.registry, schema, data)?)
    }
}
