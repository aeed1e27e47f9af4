use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Args;

use awd::manifest::Manifest;

#[derive(Args)]
pub struct SplitArgs {
    /// Manifest file to split
    manifest: PathBuf,

    /// Directory for the extracted region files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

impl SplitArgs {
    pub fn run(&self) -> Result<()> {
        let data = fs::read(&self.manifest)
            .with_context(|| format!("reading {}", self.manifest.display()))?;
        let manifest = Manifest::parse(Bytes::from(data))
            .with_context(|| format!("parsing {}", self.manifest.display()))?;

        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating {}", self.out_dir.display()))?;

        let stem = self
            .manifest
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manifest".to_string());

        for table in manifest.structure_tables().values() {
            self.write(&format!("{stem}-structure-{:#x}.bin", table.category), &table.region.bytes())?;
        }
        for table in manifest.display_tables().values() {
            self.write(&format!("{stem}-display-{:#x}.bin", table.category), &table.region.bytes())?;
        }
        if let Some(region) = manifest.identity_region() {
            self.write(&format!("{stem}-identity.bin"), &region.bytes())?;
        }
        if let Some(region) = manifest.global_types_region() {
            self.write(&format!("{stem}-global-types.bin"), &region.bytes())?;
        }
        if let Some(region) = manifest.extension_points_region() {
            self.write(&format!("{stem}-extension-points.bin"), &region.bytes())?;
        }
        Ok(())
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.out_dir.join(name);
        fs::write(&path, data).with_context(|| format!("writing {}", path.display()))?;
        println!("{} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}
