use awd_core::CompositeTag;
use awd_manifest::{
    Definition, EnumDefinition, ExtensionKind, ExtensionScope, ObjectDefinition,
    PropertyDefinition, PropertyType, TypeRef,
};
use awd_registry::{ReferencePolicy, RegistryError, ResolutionState, SchemaRegistry};

// ── helpers ──────────────────────────────────────────────────────────────────

fn object(category: u32, index: u16, name: &str) -> ObjectDefinition {
    let mut def = ObjectDefinition::new(CompositeTag::new(category, index));
    def.display_name = Some(name.to_string());
    def
}

fn property(index: u64, name: &str, value_type: PropertyType) -> PropertyDefinition {
    let mut p = PropertyDefinition::new(index, value_type);
    p.display_name = Some(name.to_string());
    p
}

/// A property that extends `target` (already-complete reference).
fn extension_property(
    index: u64,
    name: &str,
    target: CompositeTag,
    kind: ExtensionKind,
) -> PropertyDefinition {
    let mut p = property(index, name, PropertyType::Integer);
    p.extends = Some(TypeRef::Raw(target.as_u64()));
    p.extension_scope = Some(ExtensionScope::Global);
    p.extension_kind = Some(kind);
    p
}

// ── state machine ────────────────────────────────────────────────────────────

#[test]
fn phases_advance_in_order() {
    let mut registry = SchemaRegistry::new(ReferencePolicy::Lenient);
    assert_eq!(registry.state(), ResolutionState::Loading);
    registry.bind().unwrap();
    assert_eq!(registry.state(), ResolutionState::Bound);
    registry.extend().unwrap();
    assert_eq!(registry.state(), ResolutionState::Extended);
}

#[test]
fn extend_before_bind_is_rejected() {
    let mut registry = SchemaRegistry::new(ReferencePolicy::Lenient);
    assert!(matches!(
        registry.extend(),
        Err(RegistryError::InvalidState {
            expected: ResolutionState::Bound,
            actual: ResolutionState::Loading,
        })
    ));
}

#[test]
fn loading_after_bind_is_rejected() {
    let mut registry = SchemaRegistry::new(ReferencePolicy::Lenient);
    registry.bind().unwrap();
    assert!(matches!(
        registry.insert(Definition::Object(object(0x10, 0, "late"))),
        Err(RegistryError::InvalidState { .. })
    ));
}

#[test]
fn double_bind_is_rejected() {
    let mut registry = SchemaRegistry::new(ReferencePolicy::Lenient);
    registry.bind().unwrap();
    assert!(matches!(
        registry.bind(),
        Err(RegistryError::InvalidState { .. })
    ));
}

#[test]
fn duplicate_definitions_are_rejected() {
    let mut registry = SchemaRegistry::new(ReferencePolicy::Lenient);
    registry
        .insert(Definition::Object(object(0x10, 0, "first")))
        .unwrap();
    assert!(matches!(
        registry.insert(Definition::Object(object(0x10, 0, "second"))),
        Err(RegistryError::DuplicateDefinition { .. })
    ));
}

// ── bind ─────────────────────────────────────────────────────────────────────

#[test]
fn bind_completes_local_references_with_the_owning_category() {
    let nested = object(0x7a, 1, "Nested");
    let mut owner = object(0x7a, 0, "Owner");
    let mut p = property(2, "child", PropertyType::Object);
    p.object_type = Some(TypeRef::Raw(1));
    owner.properties.push(p);

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(owner)).unwrap();
    registry.insert(Definition::Object(nested)).unwrap();
    registry.bind().unwrap();

    let owner = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    assert_eq!(
        owner.properties[0].object_type,
        Some(TypeRef::Bound(CompositeTag::new(0x7a, 1)))
    );
}

#[test]
fn bind_resolves_forward_references_across_files() {
    // Object A comes from the "root" file, the referencing property from
    // an "extension" file in a different category.
    let a = object(0x10, 0, "A");
    let a_tag = a.composite_tag();

    let mut other = object(0x20, 0, "Other");
    let mut p = property(1, "link", PropertyType::Object);
    p.object_type = Some(TypeRef::Raw(a_tag.as_u64()));
    other.properties.push(p);

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(a)).unwrap();
    registry.insert(Definition::Object(other)).unwrap();
    registry.bind().unwrap();

    let other = registry.object(CompositeTag::new(0x20, 0)).unwrap();
    assert_eq!(other.properties[0].object_type, Some(TypeRef::Bound(a_tag)));
}

#[test]
fn bind_resolves_enum_references_against_the_enum_map() {
    let status = EnumDefinition::new(CompositeTag::new(0x7a, 1));
    let mut owner = object(0x7a, 0, "Owner");
    let mut p = property(1, "status", PropertyType::Enum);
    p.enum_type = Some(TypeRef::Raw(1));
    owner.properties.push(p);

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(owner)).unwrap();
    registry.insert(Definition::Enum(status)).unwrap();
    registry.bind().unwrap();

    let owner = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    assert_eq!(
        owner.properties[0].enum_type,
        Some(TypeRef::Bound(CompositeTag::new(0x7a, 1)))
    );
}

#[test]
fn strict_policy_fails_on_a_dangling_reference() {
    let mut owner = object(0x7a, 0, "Owner");
    let mut p = property(1, "ghost", PropertyType::Object);
    p.object_type = Some(TypeRef::Raw(41));
    owner.properties.push(p);

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(owner)).unwrap();
    assert!(matches!(
        registry.bind(),
        Err(RegistryError::UnresolvedReference {
            field: "object type",
            ..
        })
    ));
}

#[test]
fn lenient_policy_records_the_miss_and_continues() {
    let mut owner = object(0x7a, 0, "Owner");
    let mut ghost = property(1, "ghost", PropertyType::Object);
    ghost.object_type = Some(TypeRef::Raw(41));
    owner.properties.push(ghost);
    let mut ok = property(2, "ok", PropertyType::Object);
    ok.object_type = Some(TypeRef::Raw(1));
    owner.properties.push(ok);
    let nested = object(0x7a, 1, "Nested");

    let mut registry = SchemaRegistry::new(ReferencePolicy::Lenient);
    registry.insert(Definition::Object(owner)).unwrap();
    registry.insert(Definition::Object(nested)).unwrap();
    registry.bind().unwrap();

    let owner = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    assert_eq!(
        owner.properties[0].object_type,
        Some(TypeRef::Missing(CompositeTag::new(0x7a, 41).as_u64()))
    );
    assert_eq!(
        owner.properties[1].object_type,
        Some(TypeRef::Bound(CompositeTag::new(0x7a, 1)))
    );
}

#[test]
fn scope_with_no_target_defaults_to_the_root_object() {
    let root = object(0, 1, "Root");
    assert_eq!(root.composite_tag(), CompositeTag::ROOT_OBJECT);

    let mut extender = object(0x7a, 0, "Extender");
    let mut p = property(0x51, "added", PropertyType::Integer);
    p.extension_scope = Some(ExtensionScope::Root);
    p.extension_kind = Some(ExtensionKind::Add);
    extender.properties.push(p);

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.install_root_object(root).unwrap();
    registry.insert(Definition::Object(extender)).unwrap();
    registry.bind().unwrap();

    let extender = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    assert_eq!(
        extender.properties[0].extends,
        Some(TypeRef::Bound(CompositeTag::ROOT_OBJECT))
    );
}

// ── extend ───────────────────────────────────────────────────────────────────

#[test]
fn replace_swaps_the_property_at_the_same_index() {
    let mut target = object(0x10, 0, "Target");
    target
        .properties
        .push(property(5, "old", PropertyType::Integer));

    let mut extender = object(0x20, 0, "Extender");
    extender.properties.push(extension_property(
        5,
        "new",
        CompositeTag::new(0x10, 0),
        ExtensionKind::Replace,
    ));

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(target)).unwrap();
    registry.insert(Definition::Object(extender)).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let target = registry.object(CompositeTag::new(0x10, 0)).unwrap();
    let at_five: Vec<&str> = target
        .properties
        .iter()
        .filter(|p| p.local_index == 5)
        .map(|p| p.display_name.as_deref().unwrap())
        .collect();
    assert_eq!(at_five, vec!["new"]);
}

#[test]
fn add_keeps_both_properties_in_order() {
    let mut target = object(0x10, 0, "Target");
    target
        .properties
        .push(property(5, "old", PropertyType::Integer));

    let mut extender = object(0x20, 0, "Extender");
    extender.properties.push(extension_property(
        5,
        "extra",
        CompositeTag::new(0x10, 0),
        ExtensionKind::Add,
    ));

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(target)).unwrap();
    registry.insert(Definition::Object(extender)).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let target = registry.object(CompositeTag::new(0x10, 0)).unwrap();
    let at_five: Vec<&str> = target
        .properties
        .iter()
        .filter(|p| p.local_index == 5)
        .map(|p| p.display_name.as_deref().unwrap())
        .collect();
    assert_eq!(at_five, vec!["old", "extra"]);
}

#[test]
fn conflicting_replacements_apply_in_source_order() {
    let mut target = object(0x10, 0, "Target");
    target
        .properties
        .push(property(5, "old", PropertyType::Integer));

    let mut first = object(0x20, 0, "First");
    first.properties.push(extension_property(
        5,
        "from-first",
        CompositeTag::new(0x10, 0),
        ExtensionKind::Replace,
    ));
    let mut second = object(0x30, 0, "Second");
    second.properties.push(extension_property(
        5,
        "from-second",
        CompositeTag::new(0x10, 0),
        ExtensionKind::Replace,
    ));

    // Load order reversed from tag order; the splice order must not care.
    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(second)).unwrap();
    registry.insert(Definition::Object(target)).unwrap();
    registry.insert(Definition::Object(first)).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let target = registry.object(CompositeTag::new(0x10, 0)).unwrap();
    let at_five: Vec<&str> = target
        .properties
        .iter()
        .filter(|p| p.local_index == 5)
        .map(|p| p.display_name.as_deref().unwrap())
        .collect();
    // Ascending source tag: 0x20 applies before 0x30, so 0x30 wins.
    assert_eq!(at_five, vec!["from-second"]);
}

#[test]
fn configuration_scope_extends_the_global_types_list() {
    let mut globals = ObjectDefinition::new(CompositeTag::ROOT_OBJECT);
    globals.display_name = Some("globals".to_string());

    let mut extender = object(0x7a, 0, "Extender");
    let mut p = property(0x51, "added", PropertyType::Integer);
    p.extension_scope = Some(ExtensionScope::Configuration);
    p.extension_kind = Some(ExtensionKind::Add);
    extender.properties.push(p);

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.add_global_types(globals).unwrap();
    registry.insert(Definition::Object(extender)).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let globals = &registry.global_types()[0];
    assert_eq!(globals.properties.len(), 1);
    assert_eq!(globals.properties[0].display_name.as_deref(), Some("added"));
}
