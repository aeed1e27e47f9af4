//! Registry construction and the bind/extend resolution passes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use awd_core::CompositeTag;
use awd_manifest::{
    Definition, EnumDefinition, ExtensionKind, ExtensionScope, Manifest, ObjectDefinition,
    PropertyDefinition, TypeRef,
};
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::policy::ReferencePolicy;

/// Resolution phase of a [`SchemaRegistry`].
///
/// Phases advance strictly `Loading → Bound → Extended`; phase methods
/// called out of order fail with
/// [`RegistryError::InvalidState`](crate::RegistryError::InvalidState).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Loading,
    Bound,
    Extended,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Bound => "bound",
            Self::Extended => "extended",
        })
    }
}

/// All object and enum definitions across the loaded manifests, keyed
/// by composite tag.
///
/// The registry owns every definition; cross-definition references are
/// keys into these maps, resolved by [`bind`](Self::bind). After
/// [`extend`](Self::extend) the registry is read-only and safe to share
/// across concurrent record decodes.
#[derive(Debug)]
pub struct SchemaRegistry {
    policy: ReferencePolicy,
    state: ResolutionState,
    objects: BTreeMap<CompositeTag, ObjectDefinition>,
    enums: BTreeMap<CompositeTag, EnumDefinition>,
    /// Ambient global-types entries in load order. Their own outgoing
    /// references are never bound; they exist as configuration-scope
    /// extension targets.
    global_types: Vec<ObjectDefinition>,
    extension_points: BTreeMap<String, CompositeTag>,
}

impl SchemaRegistry {
    pub fn new(policy: ReferencePolicy) -> Self {
        Self {
            policy,
            state: ResolutionState::Loading,
            objects: BTreeMap::new(),
            enums: BTreeMap::new(),
            global_types: Vec::new(),
            extension_points: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    fn require_state(&self, expected: ResolutionState) -> Result<(), RegistryError> {
        if self.state != expected {
            return Err(RegistryError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// Insert a single definition; building block for hand-composed
    /// registries and the manifest loader.
    pub fn insert(&mut self, definition: Definition) -> Result<(), RegistryError> {
        self.require_state(ResolutionState::Loading)?;
        let tag = definition.composite_tag();
        if self.objects.contains_key(&tag) || self.enums.contains_key(&tag) {
            return Err(RegistryError::DuplicateDefinition { tag });
        }
        match definition {
            Definition::Object(object) => {
                self.objects.insert(tag, object);
            }
            Definition::Enum(en) => {
                self.enums.insert(tag, en);
            }
        }
        Ok(())
    }

    /// Install the externally built root record schema at its well-known
    /// tag.
    pub fn install_root_object(&mut self, object: ObjectDefinition) -> Result<(), RegistryError> {
        self.insert(Definition::Object(object))
    }

    /// Append an ambient global-types entry; building block for
    /// hand-composed registries (the manifest loader appends each file's
    /// global-types region automatically).
    pub fn add_global_types(&mut self, object: ObjectDefinition) -> Result<(), RegistryError> {
        self.require_state(ResolutionState::Loading)?;
        self.global_types.push(object);
        Ok(())
    }

    /// Merge one parsed manifest into the registry.
    ///
    /// Structure-table rows are canonical; display-table rows at the
    /// same position only contribute missing display names. The root
    /// manifest is loaded first, extension manifests after; order
    /// beyond that only affects the deterministic splice ordering in
    /// [`extend`](Self::extend).
    pub fn load_manifest(&mut self, manifest: &Manifest) -> Result<(), RegistryError> {
        self.require_state(ResolutionState::Loading)?;

        for table in manifest.structure_tables().values() {
            for definition in table.parse()? {
                self.insert(definition)?;
            }
        }
        for table in manifest.display_tables().values() {
            for definition in table.parse()? {
                self.overlay_display(definition)?;
            }
        }
        if let Some(globals) = manifest.global_types()? {
            self.global_types.push(globals);
        }
        if let Some(points) = manifest.extension_points()? {
            self.extension_points.extend(points);
        }
        Ok(())
    }

    /// Fill display names from a display-table row into the canonical
    /// definition at the same tag, or promote the row when the category
    /// has no structure table.
    fn overlay_display(&mut self, definition: Definition) -> Result<(), RegistryError> {
        let tag = definition.composite_tag();
        match definition {
            Definition::Object(display) => {
                if !self.objects.contains_key(&tag) {
                    return self.insert(Definition::Object(display));
                }
                if let Some(existing) = self.objects.get_mut(&tag) {
                    if existing.display_name.is_none() {
                        existing.display_name = display.display_name;
                    }
                    for (slot, named) in existing.properties.iter_mut().zip(display.properties) {
                        if slot.display_name.is_none() {
                            slot.display_name = named.display_name;
                        }
                    }
                }
            }
            Definition::Enum(display) => {
                if !self.enums.contains_key(&tag) {
                    return self.insert(Definition::Enum(display));
                }
                if let Some(existing) = self.enums.get_mut(&tag) {
                    if existing.display_name.is_none() {
                        existing.display_name = display.display_name;
                    }
                    for (slot, named) in existing.members.iter_mut().zip(display.members) {
                        if slot.display_name.is_none() {
                            slot.display_name = named.display_name;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve every integer reference into a registry key.
    ///
    /// Object and enum type references complete their partial form with
    /// the owning object's category before lookup. Extension targets
    /// resolve by scope: local completes with the owning category,
    /// root/global take the reference as already complete, and
    /// configuration resolves against the ambient global-types list. A
    /// declared scope with no explicit target defaults to the root
    /// record object.
    pub fn bind(&mut self) -> Result<(), RegistryError> {
        self.require_state(ResolutionState::Loading)?;

        let object_keys: HashSet<CompositeTag> = self.objects.keys().copied().collect();
        let enum_keys: HashSet<CompositeTag> = self.enums.keys().copied().collect();
        let global_keys: HashSet<CompositeTag> = self
            .global_types
            .iter()
            .map(ObjectDefinition::composite_tag)
            .collect();

        let policy = self.policy;
        for (tag, object) in self.objects.iter_mut() {
            for property in object.properties.iter_mut() {
                bind_property(*tag, property, &object_keys, &enum_keys, &global_keys, policy)?;
            }
        }

        self.state = ResolutionState::Bound;
        Ok(())
    }

    /// Splice every bound extension property into its target's property
    /// list.
    ///
    /// Runs only after all loads and the bind pass: an extension
    /// manifest may extend an object defined in a different file.
    /// Splices apply in ascending (source tag, property position) order
    /// so the result does not depend on file load order; the format
    /// defines no tie-break for two replacements of the same index, so
    /// the later splice in that order wins and the conflict is logged.
    pub fn extend(&mut self) -> Result<(), RegistryError> {
        self.require_state(ResolutionState::Bound)?;

        let mut splices: Vec<Splice> = Vec::new();
        for (tag, object) in &self.objects {
            for (position, property) in object.properties.iter().enumerate() {
                let Some(TypeRef::Bound(target)) = property.extends else {
                    continue;
                };
                splices.push(Splice {
                    source: *tag,
                    position,
                    target,
                    configuration: property.extension_scope
                        == Some(ExtensionScope::Configuration),
                    kind: property.extension_kind.unwrap_or(ExtensionKind::Add),
                    property: property.clone(),
                });
            }
        }
        splices.sort_by_key(|s| (s.source, s.position));

        let mut replaced: HashSet<(u64, u64)> = HashSet::new();
        for splice in splices {
            let index = splice.property.local_index;
            if splice.kind == ExtensionKind::Replace
                && !replaced.insert((splice.target.as_u64(), index))
            {
                warn!(
                    target_tag = %splice.target,
                    index,
                    source = %splice.source,
                    "conflicting property replacements; applying in source order"
                );
            }

            let properties = if splice.configuration {
                self.global_types
                    .iter_mut()
                    .find(|g| g.composite_tag() == splice.target)
                    .map(|g| &mut g.properties)
            } else {
                self.objects
                    .get_mut(&splice.target)
                    .map(|o| &mut o.properties)
            };
            let Some(properties) = properties else {
                debug!(target_tag = %splice.target, "extension target vanished before splice");
                continue;
            };

            if splice.kind == ExtensionKind::Replace {
                properties.retain(|p| p.local_index != index);
            }
            properties.push(splice.property);
        }

        self.state = ResolutionState::Extended;
        Ok(())
    }

    pub fn object(&self, tag: CompositeTag) -> Option<&ObjectDefinition> {
        self.objects.get(&tag)
    }

    pub fn enumeration(&self, tag: CompositeTag) -> Option<&EnumDefinition> {
        self.enums.get(&tag)
    }

    /// The root record object, if installed.
    pub fn root_object(&self) -> Option<&ObjectDefinition> {
        self.object(CompositeTag::ROOT_OBJECT)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.objects.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDefinition> {
        self.enums.values()
    }

    /// Ambient global-types entries, in load order.
    pub fn global_types(&self) -> &[ObjectDefinition] {
        &self.global_types
    }

    /// Merged extension points across all loaded manifests.
    pub fn extension_points(&self) -> &BTreeMap<String, CompositeTag> {
        &self.extension_points
    }
}

struct Splice {
    source: CompositeTag,
    position: usize,
    target: CompositeTag,
    configuration: bool,
    kind: ExtensionKind,
    property: PropertyDefinition,
}

fn bind_property(
    owner: CompositeTag,
    property: &mut PropertyDefinition,
    object_keys: &HashSet<CompositeTag>,
    enum_keys: &HashSet<CompositeTag>,
    global_keys: &HashSet<CompositeTag>,
    policy: ReferencePolicy,
) -> Result<(), RegistryError> {
    let category = owner.category();

    if let Some(TypeRef::Raw(raw)) = property.object_type {
        let target = CompositeTag::complete(category, raw);
        property.object_type = Some(resolve(owner, "object type", target, object_keys, policy)?);
    }
    if let Some(TypeRef::Raw(raw)) = property.enum_type {
        let target = CompositeTag::complete(category, raw);
        property.enum_type = Some(resolve(owner, "enum type", target, enum_keys, policy)?);
    }

    if property.is_extension() {
        let scope = property.extension_scope.unwrap_or(ExtensionScope::Local);
        let target = match property.extends {
            // A declared scope with no explicit target extends the root
            // record object.
            None => CompositeTag::ROOT_OBJECT,
            Some(TypeRef::Raw(raw)) => match scope {
                ExtensionScope::Local => CompositeTag::complete(category, raw),
                ExtensionScope::Root | ExtensionScope::Global | ExtensionScope::Configuration => {
                    CompositeTag::from_raw(raw)
                }
            },
            Some(TypeRef::Bound(tag)) => tag,
            Some(TypeRef::Missing(raw)) => CompositeTag::from_raw(raw),
        };
        let keys = if scope == ExtensionScope::Configuration {
            global_keys
        } else {
            object_keys
        };
        property.extends = Some(resolve(owner, "extension target", target, keys, policy)?);
    }

    Ok(())
}

fn resolve(
    owner: CompositeTag,
    field: &'static str,
    target: CompositeTag,
    keys: &HashSet<CompositeTag>,
    policy: ReferencePolicy,
) -> Result<TypeRef, RegistryError> {
    if keys.contains(&target) {
        return Ok(TypeRef::Bound(target));
    }
    match policy {
        ReferencePolicy::Strict => Err(RegistryError::UnresolvedReference {
            tag: owner,
            field,
            target,
        }),
        ReferencePolicy::Lenient => {
            warn!(owner = %owner, field, target = %target, "reference did not resolve; leaving unbound");
            Ok(TypeRef::Missing(target.as_u64()))
        }
    }
}
