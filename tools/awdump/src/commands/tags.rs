use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Args;

use awd::core::{Tag, TagPayload, read_tag, read_tags};

#[derive(Args)]
pub struct TagsArgs {
    /// Record or region file to dump
    file: PathBuf,
}

impl TagsArgs {
    pub fn run(&self) -> Result<()> {
        let data = fs::read(&self.file)
            .with_context(|| format!("reading {}", self.file.display()))?;
        let mut buf = Bytes::from(data);
        while let Some(tag) = read_tag(&mut buf)
            .with_context(|| format!("decoding tag stream in {}", self.file.display()))?
        {
            print_tag(&tag, 0);
        }
        Ok(())
    }
}

fn print_tag(tag: &Tag, indent: usize) {
    let pad = "  ".repeat(indent);
    match &tag.payload {
        TagPayload::Scalar { value, .. } => {
            println!("{pad}[{:#x}] {:?} = {value}", tag.index, tag.kind);
        }
        TagPayload::Opaque(data) => {
            // Compound payloads are indistinguishable from strings on
            // the wire; show nested tags when the payload parses as a
            // complete stream, raw bytes otherwise.
            match read_tags(data.clone()) {
                Ok(nested) if !nested.is_empty() => {
                    println!("{pad}[{:#x}] {:?} ({} bytes) {{", tag.index, tag.kind, data.len());
                    for inner in &nested {
                        print_tag(inner, indent + 1);
                    }
                    println!("{pad}}}");
                }
                _ => {
                    println!(
                        "{pad}[{:#x}] {:?} = {}",
                        tag.index,
                        tag.kind,
                        preview(data)
                    );
                }
            }
        }
    }
}

fn preview(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) if text.chars().all(|c| !c.is_control()) => format!("{text:?}"),
        _ => format!("<{} bytes>", data.len()),
    }
}
