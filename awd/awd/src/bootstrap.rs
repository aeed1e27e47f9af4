//! Hand-authored schema for the top-level record object.
//!
//! No manifest describes the root record type; its layout is known from
//! observed files. The loader installs it automatically; callers
//! composing a registry by hand install it themselves via
//! [`SchemaRegistry::install_root_object`](awd_registry::SchemaRegistry::install_root_object).

use awd_core::CompositeTag;
use awd_manifest::{IntegerFormat, ObjectDefinition, PropertyDefinition, PropertyType, TypeRef};

/// Category holding the per-trigger metrics log objects.
const METRICS_LOG_CATEGORY: u32 = 0x7a;

fn property(index: u64, name: &str, value_type: PropertyType) -> PropertyDefinition {
    let mut p = PropertyDefinition::new(index, value_type);
    p.display_name = Some(name.to_string());
    p
}

/// Build the top-level record schema.
pub fn root_object() -> ObjectDefinition {
    let mut root = ObjectDefinition::new(CompositeTag::ROOT_OBJECT);

    let mut timestamp = property(0x08, "timestamp", PropertyType::Integer);
    timestamp.integer_format = Some(IntegerFormat::Timestamp);
    root.properties.push(timestamp);

    root.properties
        .push(property(0x20, "isAnonymous", PropertyType::Boolean));
    root.properties
        .push(property(0x28, "deviceConfigId", PropertyType::Integer));
    root.properties
        .push(property(0x2d, "tz_offset", PropertyType::Integer64));
    root.properties
        .push(property(0x30, "investigationId", PropertyType::Integer));
    root.properties
        .push(property(0x31, "buildtype", PropertyType::String));
    root.properties
        .push(property(0x3a, "model", PropertyType::String));
    root.properties
        .push(property(0x42, "softwareBuild", PropertyType::String));
    root.properties
        .push(property(0x4a, "firmwareVersion", PropertyType::String));
    root.properties
        .push(property(0x68, "metric_file_type", PropertyType::Integer));

    // The metrics-log container object is defined by the category-0x7a
    // manifest table; reference it by its complete composite tag so the
    // bind pass can attach it when that manifest is loaded.
    let mut metricslogs = property(0x7a, "metricslogs", PropertyType::Object);
    metricslogs.object_type = Some(TypeRef::Raw(
        CompositeTag::new(METRICS_LOG_CATEGORY, 0).as_u64(),
    ));
    root.properties.push(metricslogs);

    root
}
