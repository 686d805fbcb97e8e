// src/commands/fetch.rs

//! Fetch command - warm the source cache

use anyhow::{Context, Result};
use larder::{load_recipe, Kitchen, LarderConfig};
use std::path::{Path, PathBuf};

pub fn cmd_fetch(
    config_path: Option<&Path>,
    reference: &str,
    version: Option<&str>,
    all_versions: bool,
    source_cache: Option<PathBuf>,
) -> Result<()> {
    let config = LarderConfig::discover(config_path).context("Failed to load configuration")?;
    let recipe =
        load_recipe(reference).with_context(|| format!("Failed to load recipe: {}", reference))?;

    let mut kitchen_config = config.kitchen;
    if let Some(dir) = source_cache {
        kitchen_config.source_cache = dir;
    }
    kitchen_config.progress = true;
    let kitchen = Kitchen::new(kitchen_config);

    let versions: Vec<&str> = if all_versions {
        recipe.versions()
    } else {
        vec![version.unwrap_or_else(|| recipe.default_version())]
    };

    for version in versions {
        let path = kitchen
            .fetch(&recipe, Some(version))
            .with_context(|| format!("Failed to fetch {} {}", recipe.package.name, version))?;
        println!("{} {}: {}", recipe.package.name, version, path.display());
    }

    Ok(())
}
