use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Args;

use awd::manifest::{Definition, Manifest};

#[derive(Args)]
pub struct InfoArgs {
    /// Manifest file to summarize
    manifest: PathBuf,
}

impl InfoArgs {
    pub fn run(&self) -> Result<()> {
        let data = fs::read(&self.manifest)
            .with_context(|| format!("reading {}", self.manifest.display()))?;
        let manifest = Manifest::parse(Bytes::from(data))
            .with_context(|| format!("parsing {}", self.manifest.display()))?;

        println!(
            "mode: {}",
            if manifest.is_root() { "root" } else { "extension" }
        );

        if let Some(identity) = manifest.identity()? {
            if let Some(name) = &identity.source_name {
                println!("source: {name}");
            }
            if let Some(hash) = &identity.hash {
                println!("hash: {}", hex::encode(hash));
            }
            if let Some(generated_at) = identity.generated_at {
                println!("generated: {generated_at}");
            }
        }

        for (category, table) in manifest.structure_tables() {
            let rows = table
                .parse()
                .with_context(|| format!("parsing structure table {category:#x}"))?;
            let objects = rows
                .iter()
                .filter(|d| matches!(d, Definition::Object(_)))
                .count();
            println!(
                "category {category:#x}: {objects} objects, {} enums",
                rows.len() - objects
            );
        }

        if let Some(points) = manifest.extension_points()? {
            println!("extension points: {}", points.len());
            for (name, target) in &points {
                println!("  {name} -> {target}");
            }
        }

        Ok(())
    }
}
