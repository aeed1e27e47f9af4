//! Indented text rendering of decoded records.

use std::fmt::Write;

use awd_core::TagPayload;

use crate::record::{DiagnosticObject, DiagnosticPayload};

/// Render a decoded record as an indented field listing.
pub fn render_text(record: &DiagnosticObject<'_>) -> String {
    let mut out = String::new();
    render_into(record, 0, &mut out);
    out
}

fn render_into(record: &DiagnosticObject<'_>, indent: usize, out: &mut String) {
    let pad = "\t".repeat(indent);
    for value in &record.values {
        match &value.payload {
            DiagnosticPayload::Scalar(scalar) => {
                let name = value.property.map(|p| p.name()).unwrap_or_default();
                let _ = writeln!(out, "{pad}{name}: {scalar}");
            }
            DiagnosticPayload::Object(nested) => {
                let name = value.property.map(|p| p.name()).unwrap_or_default();
                let _ = writeln!(out, "{pad}{name} {{");
                render_into(nested, indent + 1, out);
                let _ = writeln!(out, "{pad}}}");
            }
            DiagnosticPayload::Unknown(tag) => match &tag.payload {
                TagPayload::Scalar { value: raw, .. } => {
                    let _ = writeln!(out, "{pad}unknown[{:#x}]: {raw}", tag.index);
                }
                TagPayload::Opaque(data) => {
                    let _ = writeln!(out, "{pad}unknown[{:#x}]: <{} bytes>", tag.index, data.len());
                }
            },
        }
    }
}
