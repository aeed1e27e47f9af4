use std::fs;
use std::path::PathBuf;

use bytes::Bytes;

use awd::core::{CompositeTag, Value};
use awd::manifest::{Definition, Manifest, ObjectDefinition, PropertyDefinition, PropertyType, TypeRef};
use awd::registry::{ReferencePolicy, SchemaRegistry};
use awd::{DiagnosticPayload, MetadataLoader, decode_record, render_text, root_object};

// ── byte builders ────────────────────────────────────────────────────────────

const LENGTH_PREFIXED: u64 = 0b010;

fn encode_varint(value: u64) -> Vec<u8> {
    let mut groups = vec![(value & 0x7f) as u8];
    let mut rest = value >> 7;
    while rest != 0 {
        groups.push((rest & 0x7f) as u8 | 0x80);
        rest >>= 7;
    }
    groups.reverse();
    groups
}

fn scalar_tag(index: u64, value: u64) -> Vec<u8> {
    let mut out = encode_varint(index << 3);
    out.extend(encode_varint(value));
    out
}

fn payload_tag(index: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = encode_varint((index << 3) | LENGTH_PREFIXED);
    out.extend(encode_varint(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}

fn property_body(index: u64, type_code: u64, name: &str) -> Vec<u8> {
    let mut body = scalar_tag(1, index);
    body.extend(scalar_tag(2, type_code));
    body.extend(payload_tag(4, name.as_bytes()));
    body
}

fn object_row(name: &str, properties: &[Vec<u8>]) -> Vec<u8> {
    let mut body = payload_tag(1, name.as_bytes());
    for property in properties {
        body.extend(payload_tag(2, property));
    }
    payload_tag(1, &body)
}

/// Object row with no display names anywhere, as structure tables
/// typically carry them.
fn anonymous_object_row(properties: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for property in properties {
        body.extend(payload_tag(2, property));
    }
    payload_tag(1, &body)
}

fn bare_property_body(index: u64, type_code: u64) -> Vec<u8> {
    let mut body = scalar_tag(1, index);
    body.extend(scalar_tag(2, type_code));
    body
}

/// Container with header `(magic, 1, 1, section_count=0)` and one
/// structure plus one display table for `category`.
fn root_manifest_with_tables(category: u32, structure: &[u8], display: &[u8]) -> Vec<u8> {
    let header_len = 8 + 4 + 2 * 20 + 4;
    let mut out = Vec::new();
    out.extend_from_slice(b"AWDM");
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    let mut offset = header_len as u32;
    for (kind, table) in [(2u16, structure), (3u16, display)] {
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&category.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&(table.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        offset += table.len() as u32;
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(structure);
    out.extend_from_slice(display);
    out
}

fn example_manifest() -> Vec<u8> {
    let table = object_row("Example", &[property_body(1, 0x04, "id")]);
    root_manifest_with_tables(0x7a, &table, &table)
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("awd-decode-{}-{name}", std::process::id()))
}

// ── end to end ───────────────────────────────────────────────────────────────

#[test]
fn manifest_tables_become_one_registry_object() {
    let manifest = Manifest::parse(Bytes::from(example_manifest())).unwrap();
    assert!(manifest.is_root());

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.load_manifest(&manifest).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    assert_eq!(registry.objects().count(), 1);
    let example = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    assert_eq!(example.display_name.as_deref(), Some("Example"));
    assert_eq!(example.properties.len(), 1);
    assert_eq!(example.properties[0].display_name.as_deref(), Some("id"));
}

#[test]
fn display_table_names_overlay_anonymous_structure_rows() {
    let structure = anonymous_object_row(&[bare_property_body(1, 0x04)]);
    let display = object_row("Example", &[property_body(1, 0x04, "id")]);
    let data = root_manifest_with_tables(0x7a, &structure, &display);

    let manifest = Manifest::parse(Bytes::from(data)).unwrap();
    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.load_manifest(&manifest).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let example = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    assert_eq!(example.display_name.as_deref(), Some("Example"));
    assert_eq!(example.properties[0].display_name.as_deref(), Some("id"));
}

#[test]
fn record_scalar_decodes_against_the_schema() {
    let manifest = Manifest::parse(Bytes::from(example_manifest())).unwrap();
    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.load_manifest(&manifest).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let example = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    let record = decode_record(&registry, example, Bytes::from(scalar_tag(1, 42))).unwrap();

    assert_eq!(record.values.len(), 1);
    let value = record.value_named("id").unwrap();
    assert!(matches!(
        value.payload,
        DiagnosticPayload::Scalar(Value::Unsigned(42))
    ));
}

#[test]
fn unknown_record_tags_are_retained_not_dropped() {
    let manifest = Manifest::parse(Bytes::from(example_manifest())).unwrap();
    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.load_manifest(&manifest).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let example = registry.object(CompositeTag::new(0x7a, 0)).unwrap();
    let mut data = scalar_tag(99, 7);
    data.extend(scalar_tag(1, 42));
    let record = decode_record(&registry, example, Bytes::from(data)).unwrap();

    assert_eq!(record.values.len(), 2);
    assert!(record.values[0].property.is_none());
    assert!(matches!(
        &record.values[0].payload,
        DiagnosticPayload::Unknown(tag) if tag.index == 99
    ));
    assert!(record.values[1].property.is_some());
}

#[test]
fn object_properties_decode_recursively() {
    let mut outer = ObjectDefinition::new(CompositeTag::new(0x10, 0));
    outer.display_name = Some("Outer".to_string());
    let mut link = PropertyDefinition::new(3, PropertyType::Object);
    link.display_name = Some("inner".to_string());
    link.object_type = Some(TypeRef::Raw(1));
    outer.properties.push(link);

    let mut inner = ObjectDefinition::new(CompositeTag::new(0x10, 1));
    inner.display_name = Some("Inner".to_string());
    let mut count = PropertyDefinition::new(1, PropertyType::Integer);
    count.display_name = Some("count".to_string());
    inner.properties.push(count);

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(outer)).unwrap();
    registry.insert(Definition::Object(inner)).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let outer = registry.object(CompositeTag::new(0x10, 0)).unwrap();
    let data = payload_tag(3, &scalar_tag(1, 9));
    let record = decode_record(&registry, outer, Bytes::from(data)).unwrap();

    let DiagnosticPayload::Object(nested) = &record.values[0].payload else {
        panic!("expected a nested object");
    };
    assert_eq!(nested.schema.display_name.as_deref(), Some("Inner"));
    assert!(matches!(
        nested.value_named("count").unwrap().payload,
        DiagnosticPayload::Scalar(Value::Unsigned(9))
    ));
}

#[test]
fn scalar_tag_on_an_object_property_is_an_error() {
    let mut outer = ObjectDefinition::new(CompositeTag::new(0x10, 0));
    let mut link = PropertyDefinition::new(3, PropertyType::Object);
    link.display_name = Some("inner".to_string());
    link.object_type = Some(TypeRef::Raw(1));
    outer.properties.push(link);
    let inner = ObjectDefinition::new(CompositeTag::new(0x10, 1));

    let mut registry = SchemaRegistry::new(ReferencePolicy::Strict);
    registry.insert(Definition::Object(outer)).unwrap();
    registry.insert(Definition::Object(inner)).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let outer = registry.object(CompositeTag::new(0x10, 0)).unwrap();
    let result = decode_record(&registry, outer, Bytes::from(scalar_tag(3, 1)));
    assert!(result.is_err());
}

#[test]
fn loader_builds_a_registry_and_decodes_through_the_root_schema() {
    let path = temp_path("root.bin");
    fs::write(&path, example_manifest()).unwrap();

    let metadata = MetadataLoader::new(&path)
        .policy(ReferencePolicy::Lenient)
        .load()
        .unwrap();

    // The bootstrap root object binds its metrics-log reference to the
    // category-0x7a definition the manifest provided.
    let root = metadata.registry().root_object().unwrap();
    let logs = root.property_by_index(0x7a).unwrap();
    assert_eq!(
        logs.object_type.and_then(TypeRef::bound),
        Some(CompositeTag::new(0x7a, 0))
    );

    // A record wrapping one Example object under the metricslogs field.
    let mut data = scalar_tag(0x20, 1); // isAnonymous
    data.extend(payload_tag(0x7a, &scalar_tag(1, 42)));
    let record = metadata.decode_record(Bytes::from(data)).unwrap();

    assert!(matches!(
        record.value_named("isAnonymous").unwrap().payload,
        DiagnosticPayload::Scalar(Value::Bool(true))
    ));
    let DiagnosticPayload::Object(logs) = &record.value_named("metricslogs").unwrap().payload
    else {
        panic!("expected a nested metrics log");
    };
    assert!(matches!(
        logs.value_named("id").unwrap().payload,
        DiagnosticPayload::Scalar(Value::Unsigned(42))
    ));

    let _ = fs::remove_file(&path);
}

#[test]
fn bad_extension_manifest_is_skipped_unless_fatal() {
    let root = temp_path("skip-root.bin");
    let bad = temp_path("skip-bad.bin");
    fs::write(&root, example_manifest()).unwrap();
    fs::write(&bad, b"not a manifest").unwrap();

    let metadata = MetadataLoader::new(&root)
        .extension(&bad)
        .load()
        .unwrap();
    assert!(metadata.registry().object(CompositeTag::new(0x7a, 0)).is_some());

    let strict = MetadataLoader::new(&root)
        .extension(&bad)
        .fail_on_bad_extension(true)
        .load();
    assert!(strict.is_err());

    let _ = fs::remove_file(&root);
    let _ = fs::remove_file(&bad);
}

#[test]
fn bootstrap_root_schema_lands_at_the_well_known_tag() {
    let root = root_object();
    assert_eq!(root.composite_tag(), CompositeTag::ROOT_OBJECT);
    assert!(root.property_by_index(0x08).is_some());
    assert_eq!(
        root.property_by_index(0x7a).map(|p| p.value_type),
        Some(PropertyType::Object)
    );
}

#[test]
fn text_rendering_walks_the_tree() {
    let mut registry = SchemaRegistry::new(ReferencePolicy::Lenient);
    registry.install_root_object(root_object()).unwrap();
    registry.bind().unwrap();
    registry.extend().unwrap();

    let root = registry.root_object().unwrap();
    let mut data = scalar_tag(0x20, 0);
    data.extend(scalar_tag(0x99, 5));
    let record = decode_record(&registry, root, Bytes::from(data)).unwrap();

    let text = render_text(&record);
    assert!(text.contains("isAnonymous: false"));
    assert!(text.contains("unknown[0x99]: 5"));
}
