// src/commands/cook.rs

//! Cook command - build and publish packages from recipes

use super::resolve_target;
use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use larder::recipe::validate_recipe;
use larder::Kitchen;
use std::path::{Path, PathBuf};
use tracing::info;

/// Flags of `larder cook` that adjust the kitchen
#[derive(Debug, Default)]
pub struct CookArgs {
    pub output: Option<PathBuf>,
    pub source_cache: Option<PathBuf>,
    pub jobs: Option<u32>,
    pub cmake: Option<String>,
    pub generator: Option<String>,
    pub prefixes: Vec<String>,
    pub allow_system_deps: bool,
    pub keep_builddir: bool,
    pub validate_only: bool,
    pub fetch_only: bool,
    pub progress: bool,
}

/// Cook a package from a recipe
pub fn cmd_cook(config_path: Option<&Path>, target: &TargetArgs, args: CookArgs) -> Result<()> {
    let (config, recipe, configuration) = resolve_target(config_path, target)?;

    println!(
        "Recipe: {} version {} for {}",
        configuration.name, configuration.version, configuration.platform
    );

    // Validate the recipe
    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if args.validate_only {
        println!("Recipe validation passed");
        if warnings.is_empty() {
            println!("[OK] No issues found");
        } else {
            println!("[OK] {} warning(s)", warnings.len());
        }
        return Ok(());
    }

    // Configure the kitchen: file settings, then flags
    let mut kitchen_config = config.kitchen;
    if let Some(dir) = args.output {
        kitchen_config.output_dir = dir;
    }
    if let Some(dir) = args.source_cache {
        kitchen_config.source_cache = dir;
    }
    if let Some(j) = args.jobs {
        kitchen_config.jobs = j;
    }
    if let Some(cmake) = args.cmake {
        kitchen_config.cmake = cmake;
    }
    if args.generator.is_some() {
        kitchen_config.generator = args.generator;
    }
    for prefix in &args.prefixes {
        let (name, path) = prefix
            .split_once('=')
            .with_context(|| format!("Prefix must be NAME=PATH, got '{}'", prefix))?;
        kitchen_config
            .dependency_prefixes
            .insert(name.to_string(), PathBuf::from(path));
    }
    kitchen_config.allow_system_dependencies |= args.allow_system_deps;
    kitchen_config.keep_builddir |= args.keep_builddir;
    kitchen_config.progress |= args.progress;

    let kitchen = Kitchen::new(kitchen_config);

    // Fetch-only mode: just download sources and exit
    if args.fetch_only {
        println!("Fetching sources (fetch-only mode)...");
        let source = kitchen
            .fetch(&recipe, Some(&configuration.version))
            .with_context(|| format!("Failed to fetch sources for {}", recipe.package.name))?;
        println!("\n[COMPLETE] Fetched {}", source.display());
        return Ok(());
    }

    println!(
        "Cooking with {} parallel jobs into {}...",
        kitchen.config().jobs,
        kitchen.config().output_dir.display()
    );
    if kitchen.sources_cached(&recipe, &configuration.version)? {
        println!("  - Sources already cached (offline build possible)");
    }

    let result = kitchen
        .cook(&recipe, &configuration)
        .with_context(|| format!("Failed to cook {}", recipe.package.name))?;

    println!("\n[COMPLETE] Cooked: {}", result.package_dir.display());
    println!("  package id: {}", result.package_id);
    println!("  files:      {}", result.manifest.files.len());
    if let Some(dir) = &result.build_dir {
        println!("  build dir:  {}", dir.display());
    }

    if !result.warnings.is_empty() {
        println!("\nBuild warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    info!(
        "Successfully cooked {} to {}",
        recipe.package.name,
        result.package_dir.display()
    );

    Ok(())
}
