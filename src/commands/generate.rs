// src/commands/generate.rs

//! Generate command - write build descriptors without building

use super::resolve_target;
use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use larder::recipe::kitchen::generate::write_descriptors;
use std::path::Path;

pub fn cmd_generate(config_path: Option<&Path>, target: &TargetArgs, dest: &Path) -> Result<()> {
    let (_, recipe, config) = resolve_target(config_path, target)?;

    let written = write_descriptors(&recipe, &config, dest)
        .with_context(|| format!("Failed to write descriptors into {}", dest.display()))?;

    if written.is_empty() {
        println!(
            "{} {} builds with its own CMake project; nothing to generate",
            config.name, config.version
        );
        return Ok(());
    }

    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
